//! ORM-facing facade: every call names its connection by identity.

use std::collections::HashMap;
use std::sync::Arc;

use protocol::{
    AssociationCommand, CollectionName, CollectionSchema, ConnectionConfig, Criteria, Method,
    RegistrationError, WireResponse,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{translator, Connection, ConnectionRegistry, OperationError};

/// Name under which the adapter presents itself to the ORM.
pub const ADAPTER_IDENTITY: &str = "sockline";

/// Default primary-key format of remote collections.
pub const PK_FORMAT: &str = "integer";

/// The server owns the schema; the adapter never migrates it.
pub const SYNCABLE: bool = false;

/// A connection as declared by the ORM or a configuration file.
///
/// Connection settings sit at the top level next to `identity` and
/// `collections`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectionDefinition {
    #[serde(default)]
    pub identity: Option<String>,

    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Collection schemas, keyed by collection name.
    #[serde(default)]
    pub collections: HashMap<CollectionName, CollectionSchema>,
}

/// Dispatches ORM calls to the connection registered under each identity.
#[derive(Debug)]
pub struct Adapter {
    registry: ConnectionRegistry,
}

impl Adapter {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Configuration applied to keys a connection does not set.
    pub fn defaults() -> ConnectionConfig {
        ConnectionConfig::default()
    }

    pub fn register_connection(
        &self,
        definition: ConnectionDefinition,
    ) -> Result<Arc<Connection>, RegistrationError> {
        let identity = definition.identity.as_deref().unwrap_or_default();
        self.registry
            .register(identity, definition.config, definition.collections)
    }

    /// Tears down one connection, or all of them when `identity` is `None`.
    pub async fn teardown(&self, identity: Option<&str>) {
        self.registry.teardown(identity).await;
    }

    pub async fn find(
        &self,
        connection: &str,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Value>, OperationError> {
        self.connection(connection)?
            .select(collection, criteria)
            .await
    }

    pub async fn create(
        &self,
        connection: &str,
        collection: &str,
        values: &Value,
    ) -> Result<Value, OperationError> {
        self.connection(connection)?
            .insert(collection, values)
            .await
    }

    pub async fn update(
        &self,
        connection: &str,
        collection: &str,
        criteria: &Criteria,
        values: &Value,
    ) -> Result<Vec<Value>, OperationError> {
        self.connection(connection)?
            .update(collection, criteria, values)
            .await
    }

    pub async fn destroy(
        &self,
        connection: &str,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Value>, OperationError> {
        self.connection(connection)?
            .destroy(collection, criteria)
            .await
    }

    pub fn describe(
        &self,
        connection: &str,
        collection: &str,
    ) -> Result<Option<CollectionSchema>, OperationError> {
        Ok(self.connection(connection)?.describe(collection).cloned())
    }

    pub async fn join(
        &self,
        connection: &str,
        collection: &str,
        criteria: Criteria,
    ) -> Result<Vec<Value>, OperationError> {
        let connection = self.connection(connection)?;
        translator::join(&connection, collection, criteria).await
    }

    pub async fn add_to(
        &self,
        connection: &str,
        collection: &str,
        command: &AssociationCommand,
    ) -> Result<Value, OperationError> {
        let connection = self.connection(connection)?;
        translator::add_to(&connection, collection, command)?.await
    }

    pub async fn remove_from(
        &self,
        connection: &str,
        collection: &str,
        command: &AssociationCommand,
    ) -> Result<Value, OperationError> {
        let connection = self.connection(connection)?;
        translator::remove_from(&connection, collection, command)?.await
    }

    /// Raw passthrough to the connection's socket.
    pub async fn socket_request(
        &self,
        connection: &str,
        method: Method,
        url: &str,
        data: Value,
    ) -> Result<(Value, WireResponse), OperationError> {
        self.connection(connection)?
            .raw_request(method, url, data)
            .await
    }

    fn connection(&self, identity: &str) -> Result<Arc<Connection>, OperationError> {
        self.registry
            .get(identity)
            .ok_or_else(|| OperationError::UnknownConnection {
                identity: identity.to_owned(),
            })
    }
}
