mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{bare_config, registry};
use connection::{Adapter, ConnectionDefinition, OperationError};
use protocol::{Criteria, ExecutionMode, RegistrationError};
use serde_json::json;

#[tokio::test]
async fn duplicate_identity_is_rejected() {
    let (registry, factory) = registry(ExecutionMode::Development);
    registry
        .register("db1", bare_config(), HashMap::new())
        .expect("first registration");

    let err = registry
        .register("db1", bare_config(), HashMap::new())
        .expect_err("duplicate");
    assert_eq!(
        err,
        RegistrationError::IdentityDuplicate {
            identity: "db1".into()
        }
    );
    // The losing registration never built a transport.
    assert_eq!(factory.created(), 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn blank_identity_is_missing() {
    let (registry, factory) = registry(ExecutionMode::Development);
    for identity in ["", "  "] {
        assert_eq!(
            registry
                .register(identity, bare_config(), HashMap::new())
                .expect_err("missing"),
            RegistrationError::IdentityMissing
        );
    }
    assert_eq!(factory.created(), 0);
    assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_has_one_winner() {
    let (registry, _factory) = registry(ExecutionMode::Development);
    let registry = Arc::new(registry);

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .register("shared", bare_config(), HashMap::new())
                    .is_ok()
            })
        })
        .collect();

    let mut winners = 0;
    for attempt in attempts {
        if attempt.await.expect("task") {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn teardown_closes_and_forgets_the_connection() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry
        .register("db1", bare_config(), HashMap::new())
        .expect("register");

    registry.teardown(Some("db1")).await;

    assert!(registry.get("db1").is_none());
    assert!(connection.is_closed());
    assert_eq!(factory.transport("db1").disconnects(), 1);

    let err = connection
        .select("Pet", &Criteria::default())
        .await
        .expect_err("closed");
    assert!(matches!(err, OperationError::ConnectionClosed { .. }));
    assert!(factory.transport("db1").requests().is_empty());

    // Idempotent, and unknown identities are ignored.
    registry.teardown(Some("db1")).await;
    registry.teardown(Some("unknown")).await;
    assert_eq!(factory.transport("db1").disconnects(), 1);
}

#[tokio::test]
async fn global_teardown_closes_everything() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let a = registry.register("a", bare_config(), HashMap::new()).expect("a");
    let b = registry.register("b", bare_config(), HashMap::new()).expect("b");

    registry.teardown(None).await;

    assert!(registry.is_empty());
    assert!(a.is_closed() && b.is_closed());
    assert_eq!(factory.transport("a").disconnects(), 1);
    assert_eq!(factory.transport("b").disconnects(), 1);

    // The identity is free again.
    registry
        .register("a", bare_config(), HashMap::new())
        .expect("re-register");
    assert_eq!(registry.identities().len(), 1);
}

#[tokio::test]
async fn adapter_routes_calls_by_identity() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let adapter = Adapter::new(registry);

    let definition: ConnectionDefinition = serde_json::from_value(json!({
        "identity": "db1",
        "basePath": "/v1",
        "autoConnect": false,
        "collections": {"pet": {"name": {"type": "string"}}}
    }))
    .expect("definition");
    adapter.register_connection(definition).expect("register");

    adapter
        .update("db1", "pet", &Criteria::by_id(5), &json!({"name": "Rex"}))
        .await
        .expect("update");
    assert_eq!(factory.transport("db1").last_request().url, "/v1/pet/5");

    let schema = adapter.describe("db1", "pet").expect("describe");
    assert_eq!(
        schema.map(|s| s.definition().clone()),
        Some(json!({"name": {"type": "string"}}))
    );
}

#[tokio::test]
async fn adapter_reports_unknown_connections() {
    let (registry, _factory) = registry(ExecutionMode::Development);
    let adapter = Adapter::new(registry);

    let err = adapter
        .find("nope", "pet", &Criteria::default())
        .await
        .expect_err("unknown");
    assert_eq!(
        err,
        OperationError::UnknownConnection {
            identity: "nope".into()
        }
    );
}

#[tokio::test]
async fn adapter_requires_an_identity() {
    let (registry, _factory) = registry(ExecutionMode::Development);
    let adapter = Adapter::new(registry);

    let err = adapter
        .register_connection(ConnectionDefinition::default())
        .expect_err("missing");
    assert_eq!(err, RegistrationError::IdentityMissing);
}
