//! The table of live connections.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use protocol::{
    CollectionName, CollectionSchema, ConnectionConfig, ConnectionIdentity, ExecutionMode,
    RegistrationError, TransportFactory,
};
use tracing::{debug, info};

use crate::Connection;

/// Maps connection identities to live [`Connection`]s.
///
/// Owned by the application's start-up/shutdown sequence and passed by
/// reference to whatever needs to look connections up. Identity uniqueness is
/// checked and enforced under one write lock, so concurrent registrations of
/// the same identity produce exactly one connection.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionIdentity, Arc<Connection>>>,
    factory: Arc<dyn TransportFactory>,
    mode: ExecutionMode,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("identities", &self.identities())
            .field("mode", &self.mode)
            .finish()
    }
}

impl ConnectionRegistry {
    /// Creates an empty registry. `factory` supplies one transport per
    /// registered connection.
    pub fn new(factory: Arc<dyn TransportFactory>, mode: ExecutionMode) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            factory,
            mode,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Creates and stores a connection under `identity`.
    ///
    /// Fails with [`RegistrationError::IdentityMissing`] for a blank identity
    /// and [`RegistrationError::IdentityDuplicate`] if the identity is live.
    pub fn register(
        &self,
        identity: &str,
        config: ConnectionConfig,
        schemas: HashMap<CollectionName, CollectionSchema>,
    ) -> Result<Arc<Connection>, RegistrationError> {
        let identity = ConnectionIdentity::new(identity).ok_or(RegistrationError::IdentityMissing)?;

        let mut connections = self.write();
        match connections.entry(identity) {
            Entry::Occupied(entry) => Err(RegistrationError::IdentityDuplicate {
                identity: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                let identity = entry.key().clone();
                let transport = self.factory.create(&identity, &config);
                info!(
                    connection = %identity,
                    url = %config.url(),
                    base_path = %config.base_path,
                    collections = schemas.len(),
                    "registering connection"
                );
                let connection = Arc::new(Connection::open(
                    identity, config, schemas, transport, self.mode,
                ));
                entry.insert(Arc::clone(&connection));
                Ok(connection)
            }
        }
    }

    /// Looks up a live connection.
    pub fn get(&self, identity: &str) -> Option<Arc<Connection>> {
        self.read().get(identity).cloned()
    }

    /// Tears down one connection, or every connection when `identity` is
    /// `None`. Unknown identities are ignored.
    pub async fn teardown(&self, identity: Option<&str>) {
        let removed: Vec<Arc<Connection>> = {
            let mut connections = self.write();
            match identity {
                Some(identity) => connections.remove(identity).into_iter().collect(),
                None => connections.drain().map(|(_, connection)| connection).collect(),
            }
        };

        if removed.is_empty() {
            debug!(identity = ?identity, "teardown: nothing registered");
        }
        for connection in removed {
            connection.teardown().await;
        }
    }

    /// Identities of all live connections, sorted.
    pub fn identities(&self) -> Vec<ConnectionIdentity> {
        let mut identities: Vec<_> = self.read().keys().cloned().collect();
        identities.sort();
        identities
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionIdentity, Arc<Connection>>> {
        self.connections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionIdentity, Arc<Connection>>> {
        self.connections.write().unwrap_or_else(PoisonError::into_inner)
    }
}
