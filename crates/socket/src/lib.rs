//! Sockline WebSocket transport adapter.
//!
//! Implements [`protocol::SocketTransport`] over one persistent WebSocket per
//! connection, using `tokio-tungstenite`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Frame encoding, request correlation, and socket
//! lifecycle live here. The `connection` crate sees only
//! [`protocol::SocketTransport`] and [`protocol::TransportFactory`].
//!
//! ## Framing
//!
//! Every request is one JSON text message:
//! `{"id", "method", "url", "data", "headers"}`. The server answers with
//! `{"id", "statusCode", "body"}` carrying the same `id`. Responses are matched
//! by id, so they may arrive in any order.

pub mod codec;
pub mod transport;

pub use codec::{RequestFrame, ResponseFrame};
pub use transport::{websocket_url, WebSocketTransport, WebSocketTransportFactory};
