//! Port traits for the socket transport.
//!
//! The `connection` crate drives these traits; the `socket` crate implements
//! them over WebSockets. Tests substitute in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{ConnectionConfig, ConnectionIdentity, TransportError, WireRequest, WireResponse};

/// One persistent, bidirectional socket.
///
/// Implementations must allow many requests in flight at once and correlate
/// each response with its request. Nothing here retries.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    /// Opens the socket. Calling it on an open socket is a no-op.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Sends one request and waits for its response.
    ///
    /// Opens the socket first if it is not open yet.
    async fn request(&self, request: WireRequest) -> Result<WireResponse, TransportError>;

    /// Closes the socket without waiting for outstanding requests; they fail
    /// with [`TransportError::Disconnected`]. Never fails.
    async fn disconnect(&self);

    /// Returns `true` while the socket is open.
    fn is_connected(&self) -> bool;
}

/// Builds the transport for a newly registered connection.
pub trait TransportFactory: Send + Sync {
    fn create(
        &self,
        identity: &ConnectionIdentity,
        config: &ConnectionConfig,
    ) -> Arc<dyn SocketTransport>;
}
