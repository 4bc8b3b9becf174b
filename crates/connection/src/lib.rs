//! Sockline connection layer.
//!
//! Owns the live side of the adapter: one [`Connection`] per registered
//! identity, each wrapping a single persistent socket; the
//! [`ConnectionRegistry`] that creates and tears them down; the
//! [`translator`] functions for association mutations and server-side joins;
//! and the [`Adapter`] facade that ORM calls enter through.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences calls between the business logic in the
//! [`protocol`] crate and a [`protocol::SocketTransport`]. Route building and
//! response classification live in [`protocol`]; this crate adds lifecycle,
//! latency injection, and teardown semantics.
//!
//! ## Concurrency
//!
//! Requests are dispatched as soon as they are issued and may be in flight
//! concurrently over one socket. Nothing is retried. Teardown does not wait
//! for outstanding requests; they resolve with
//! [`OperationError::ConnectionClosed`].

pub mod adapter;
pub mod connection;
pub mod errors;
pub mod registry;
pub mod translator;

pub use adapter::{Adapter, ConnectionDefinition, ADAPTER_IDENTITY, PK_FORMAT, SYNCABLE};
pub use connection::Connection;
pub use errors::OperationError;
pub use registry::ConnectionRegistry;
pub use translator::PendingRequest;
