//! Core domain for Sockline.
//!
//! Sockline lets an ORM run CRUD and association operations against a remote
//! server over one persistent socket per logical database. This crate holds
//! everything about that exchange that does not touch I/O: identifiers,
//! configuration, query envelopes, the single-vs-bulk decision, route
//! construction, response classification, and the transport port traits.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! The `connection` crate sequences calls against [`SocketTransport`]; the
//! `socket` crate supplies a WebSocket implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ConnectionIdentity`, `CollectionName`, `RecordId`) |
//! | [`types`] | Configuration and wire envelopes (`ConnectionConfig`, `WireRequest`, etc.) |
//! | [`criteria`] | Query/association envelopes and id extraction |
//! | [`routes`] | Operation-to-request translation |
//! | [`classify`] | Status-code classification |
//! | [`errors`] | Error taxonomy |
//! | [`transport`] | `SocketTransport` and `TransportFactory` ports |

pub mod classify;
pub mod criteria;
pub mod errors;
pub mod identifiers;
pub mod routes;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use classify::classify;
pub use criteria::{
    extract_id, AssociationCommand, AssociationTarget, Criteria, ForeignTarget, JoinInstruction,
    Target,
};
pub use errors::{AdapterError, ContractError, ErrorKind, RegistrationError, TransportError};
pub use identifiers::{CollectionName, ConnectionIdentity, RecordId};
pub use routes::Routes;
pub use transport::{SocketTransport, TransportFactory};
pub use types::{
    into_records, CollectionSchema, ConnectionConfig, ExecutionMode, Method, Protocol,
    WireRequest, WireResponse,
};
