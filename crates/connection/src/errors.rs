//! Operation-level error type.
//!
//! Wraps the domain errors from [`protocol`] together with the two failure
//! modes that only exist once connections are live: operating on a torn-down
//! connection, and naming a connection that was never registered.

use protocol::{AdapterError, ConnectionIdentity, ContractError, TransportError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    /// The server answered with a failure status.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// The socket failed before a response arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The call itself was malformed; nothing was sent.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The connection was torn down before or while the operation ran.
    #[error("Connection '{identity}' has been torn down")]
    ConnectionClosed { identity: ConnectionIdentity },

    /// No connection is registered under this identity.
    #[error("No connection registered as '{identity}'")]
    UnknownConnection { identity: String },
}

impl OperationError {
    /// Returns the classified server error, if that is what this is.
    pub fn as_adapter_error(&self) -> Option<&AdapterError> {
        match self {
            Self::Adapter(err) => Some(err),
            _ => None,
        }
    }
}
