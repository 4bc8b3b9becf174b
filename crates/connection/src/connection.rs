//! One live connection: a socket plus the schemas registered with it.

use std::collections::HashMap;
use std::sync::Arc;

use protocol::{
    into_records, CollectionName, CollectionSchema, ConnectionConfig, ConnectionIdentity,
    Criteria, ExecutionMode, Method, Routes, SocketTransport, WireRequest, WireResponse,
};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::OperationError;

/// A persistent socket session bound to one connection identity.
///
/// Owns its transport exclusively. Every semantic operation sends exactly one
/// request and classifies the response before returning it. After
/// [`Connection::teardown`] every operation fails with
/// [`OperationError::ConnectionClosed`], including operations that were
/// already waiting for a response.
pub struct Connection {
    identity: ConnectionIdentity,
    config: ConnectionConfig,
    schemas: HashMap<CollectionName, CollectionSchema>,
    transport: Arc<dyn SocketTransport>,
    mode: ExecutionMode,
    closed: watch::Sender<bool>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("identity", &self.identity)
            .field("url", &self.config.url())
            .field("base_path", &self.config.base_path)
            .field("collections", &self.schemas.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    /// Creates a connection over `transport`.
    ///
    /// With `auto_connect` set the socket starts opening in the background
    /// (when called inside a Tokio runtime); otherwise it opens on the first
    /// request.
    pub fn open(
        identity: ConnectionIdentity,
        config: ConnectionConfig,
        schemas: HashMap<CollectionName, CollectionSchema>,
        transport: Arc<dyn SocketTransport>,
        mode: ExecutionMode,
    ) -> Self {
        let (closed, _) = watch::channel(false);
        let connection = Self {
            identity,
            config,
            schemas,
            transport,
            mode,
            closed,
        };
        if connection.config.auto_connect {
            connection.spawn_connect();
        }
        connection
    }

    fn spawn_connect(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(connection = %self.identity, "no runtime; socket opens on first request");
            return;
        };
        let transport = Arc::clone(&self.transport);
        let identity = self.identity.clone();
        let url = self.config.url();
        runtime.spawn(async move {
            match transport.connect().await {
                Ok(()) => info!(connection = %identity, %url, "socket connected"),
                Err(err) => warn!(
                    connection = %identity,
                    %url,
                    error = %err,
                    "socket connect failed; next request reconnects"
                ),
            }
        });
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// `true` once [`Connection::teardown`] has run.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// `true` while the underlying socket is open.
    pub fn is_connected(&self) -> bool {
        !self.is_closed() && self.transport.is_connected()
    }

    // -----------------------------------------------------------------------
    // Semantic operations
    // -----------------------------------------------------------------------

    /// Finds records matching `criteria`.
    #[instrument(level = "debug", skip_all, fields(connection = %self.identity, collection = %collection))]
    pub async fn select(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Value>, OperationError> {
        let request = self.routes().select(collection, criteria);
        self.send(request).await.map(into_records)
    }

    /// Creates one record and returns it as stored by the server.
    #[instrument(level = "debug", skip_all, fields(connection = %self.identity, collection = %collection))]
    pub async fn insert(&self, collection: &str, values: &Value) -> Result<Value, OperationError> {
        let request = self.routes().insert(collection, values);
        self.send(request).await
    }

    /// Updates the record addressed by `criteria` (or `values.id`), or every
    /// matching record when no single key resolves.
    #[instrument(level = "debug", skip_all, fields(connection = %self.identity, collection = %collection))]
    pub async fn update(
        &self,
        collection: &str,
        criteria: &Criteria,
        values: &Value,
    ) -> Result<Vec<Value>, OperationError> {
        let request = self.routes().update(collection, criteria, values);
        self.send(request).await.map(into_records)
    }

    /// Destroys the record addressed by `criteria`, or every matching record
    /// when no single key resolves.
    #[instrument(level = "debug", skip_all, fields(connection = %self.identity, collection = %collection))]
    pub async fn destroy(
        &self,
        collection: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Value>, OperationError> {
        let request = self.routes().destroy(collection, criteria);
        self.send(request).await.map(into_records)
    }

    /// Returns the schema registered for `collection`.
    pub fn describe(&self, collection: &str) -> Option<&CollectionSchema> {
        self.schemas.get(collection)
    }

    /// Delivers the result of [`Connection::describe`] to `callback` on a
    /// spawned task, never inline.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn describe_with<F>(&self, collection: &str, callback: F)
    where
        F: FnOnce(Option<CollectionSchema>) + Send + 'static,
    {
        let schema = self.describe(collection).cloned();
        tokio::spawn(async move { callback(schema) });
    }

    /// Sends `payload` to `path` with any verb and returns both the body and
    /// the untouched response.
    ///
    /// `path` is used as given; the base path is not prepended.
    #[instrument(level = "debug", skip_all, fields(connection = %self.identity, method = %method, path = %path))]
    pub async fn raw_request(
        &self,
        method: Method,
        path: &str,
        payload: Value,
    ) -> Result<(Value, WireResponse), OperationError> {
        let response = self
            .dispatch(WireRequest::new(method, path, payload))
            .await?;
        let body = response.clone().into_result()?;
        Ok((body, response))
    }

    /// Sends one request and classifies its response.
    pub async fn send(&self, request: WireRequest) -> Result<Value, OperationError> {
        let response = self.dispatch(request).await?;
        response.into_result().map_err(|err| {
            debug!(
                connection = %self.identity,
                status = err.status_code(),
                kind = %err.kind(),
                "request failed"
            );
            OperationError::Adapter(err)
        })
    }

    /// Closes the socket. Outstanding operations resolve with
    /// [`OperationError::ConnectionClosed`]; responses that still arrive are
    /// dropped. Calling it again does nothing.
    pub async fn teardown(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        self.transport.disconnect().await;
        info!(connection = %self.identity, "connection torn down");
    }

    // -----------------------------------------------------------------------

    fn routes(&self) -> Routes<'_> {
        Routes::new(&self.config)
    }

    fn closed_error(&self) -> OperationError {
        OperationError::ConnectionClosed {
            identity: self.identity.clone(),
        }
    }

    async fn dispatch(&self, request: WireRequest) -> Result<WireResponse, OperationError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(self.closed_error());
        }

        if let Some(delay) = self.config.simulated_delay(self.mode) {
            debug!(connection = %self.identity, delay_ms = delay.as_millis() as u64, "simulating latency");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_closed(&mut closed) => return Err(self.closed_error()),
            }
        }

        debug!(
            connection = %self.identity,
            method = %request.method,
            url = %request.url,
            "dispatching request"
        );
        let response = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => return Err(self.closed_error()),
            result = self.transport.request(request) => result?,
        };

        if self.is_closed() {
            debug!(connection = %self.identity, "dropping response received after teardown");
            return Err(self.closed_error());
        }
        Ok(response)
    }
}

/// Resolves once the connection has been marked closed.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    // The sender lives as long as the connection, so an error cannot outlive it.
    let _ = closed.wait_for(|c| *c).await;
}
