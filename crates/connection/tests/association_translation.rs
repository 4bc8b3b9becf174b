mod common;

use std::collections::HashMap;

use common::{bare_config, registry};
use connection::{translator, Adapter, OperationError};
use protocol::{
    AssociationCommand, ContractError, Criteria, ErrorKind, ExecutionMode, JoinInstruction,
    Method,
};
use serde_json::json;

fn command(value: serde_json::Value) -> AssociationCommand {
    serde_json::from_value(value).expect("command")
}

#[tokio::test]
async fn add_to_with_foreign_id_appends_it_to_the_path() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry.register("db1", bare_config(), HashMap::new()).expect("register");

    translator::add_to(
        &connection,
        "Pet",
        &command(json!({"id": 1, "association": "toys", "foreignId": 9})),
    )
    .expect("valid command")
    .await
    .expect("add");

    let request = factory.transport("db1").last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "/Pet/1/toys/9");
    assert_eq!(request.data, json!({}));
}

#[tokio::test]
async fn remove_from_with_foreign_data_sends_it_as_body() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry.register("db1", bare_config(), HashMap::new()).expect("register");

    translator::remove_from(
        &connection,
        "Pet",
        &command(json!({"id": 1, "association": "toys", "foreignData": {"name": "ball"}})),
    )
    .expect("valid command")
    .await
    .expect("remove");

    let request = factory.transport("db1").last_request();
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.url, "/Pet/1/toys");
    assert_eq!(request.data, json!({"name": "ball"}));
}

#[tokio::test]
async fn malformed_commands_fail_before_any_io() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry.register("db1", bare_config(), HashMap::new()).expect("register");

    let cases = [
        (json!({"association": "toys", "foreignId": 9}), ContractError::MissingRecordId),
        (json!({"id": 1, "foreignId": 9}), ContractError::MissingAssociation),
        (json!({"id": 1, "association": "toys"}), ContractError::MissingForeignTarget),
    ];
    for (raw, expected) in cases {
        let result = translator::add_to(&connection, "Pet", &command(raw));
        assert_eq!(result.err(), Some(expected));
    }
    assert!(factory.transport("db1").requests().is_empty());
}

#[tokio::test]
async fn callback_form_delivers_the_classified_outcome() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry.register("db1", bare_config(), HashMap::new()).expect("register");
    factory.transport("db1").respond_with(404, json!("no such pet"));

    let (tx, rx) = tokio::sync::oneshot::channel();
    translator::add_to_with(
        &connection,
        "Pet",
        &command(json!({"id": 1, "association": "toys", "foreignId": 9})),
        move |outcome| {
            let _ = tx.send(outcome);
        },
    )
    .expect("valid command");

    let outcome = rx.await.expect("callback ran");
    let err = outcome.expect_err("not found");
    assert_eq!(err.as_adapter_error().map(|e| e.kind()), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn callback_form_rejects_malformed_commands_synchronously() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry.register("db1", bare_config(), HashMap::new()).expect("register");

    let result = translator::remove_from_with(
        &connection,
        "Pet",
        &AssociationCommand::default(),
        |_| panic!("callback must not run"),
    );
    assert_eq!(result, Err(ContractError::MissingRecordId));
    assert!(factory.transport("db1").requests().is_empty());
}

#[tokio::test]
async fn join_rewrites_the_plan_into_populate() {
    let (registry, factory) = registry(ExecutionMode::Development);
    let connection = registry.register("db1", bare_config(), HashMap::new()).expect("register");

    let criteria = Criteria {
        where_clause: Some(json!({})),
        joins: Some(vec![JoinInstruction::new("owner")]),
        ..Criteria::default()
    };
    translator::join(&connection, "Pet", criteria).await.expect("join");

    let request = factory.transport("db1").last_request();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "/Pet");
    assert_eq!(request.data, json!({"where": {}, "populate": ["owner"]}));
}

#[tokio::test]
async fn adapter_surfaces_contract_errors_as_operation_errors() {
    let (registry, _factory) = registry(ExecutionMode::Development);
    let adapter = Adapter::new(registry);
    adapter
        .registry()
        .register("db1", bare_config(), HashMap::new())
        .expect("register");

    let err = adapter
        .remove_from("db1", "Pet", &command(json!({"id": 1, "association": "toys"})))
        .await
        .expect_err("contract");
    assert_eq!(
        err,
        OperationError::Contract(ContractError::MissingForeignTarget)
    );
}
