//! Error types for the Sockline domain.
//!
//! [`AdapterError`] is what a caller sees when the server answered with a
//! failure status; it is produced only by [`crate::classify`]. The remaining
//! types describe failures that never reach the server: bad registrations,
//! malformed association commands, and transport breakage.
//!
//! None of these errors is retried anywhere in the workspace. Each is produced
//! once and handed to the caller unchanged.

use serde_json::{json, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Server-reported failures
// ---------------------------------------------------------------------------

/// Stable category of an [`AdapterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Fatal,
}

impl ErrorKind {
    /// Returns the conventional error code, e.g. `E_VALIDATION`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "E_VALIDATION",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::NotFound => "E_NOT_FOUND",
            Self::Fatal => "E_FATAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A failure status returned by the server, with the response body attached.
///
/// Every variant keeps the original status code. Client-error variants expose
/// the body as `messages`; [`AdapterError::Fatal`] exposes it as `message`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// `400`: the server rejected the values.
    #[error("E_VALIDATION ({status_code}): {messages}")]
    Validation { status_code: u16, messages: Value },

    /// `401`: the socket session is not allowed to perform the operation.
    ///
    /// Also counts as a validation-class error.
    #[error("E_UNAUTHORIZED ({status_code}): {messages}")]
    Unauthorized { status_code: u16, messages: Value },

    /// `404`: the addressed record or route does not exist.
    #[error("E_NOT_FOUND ({status_code}): {messages}")]
    NotFound { status_code: u16, messages: Value },

    /// Any other non-2xx status.
    #[error("E_FATAL ({status_code}): {message}")]
    Fatal { status_code: u16, message: Value },
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Fatal { .. } => ErrorKind::Fatal,
        }
    }

    /// Returns the status code the server answered with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { status_code, .. }
            | Self::Unauthorized { status_code, .. }
            | Self::NotFound { status_code, .. }
            | Self::Fatal { status_code, .. } => *status_code,
        }
    }

    /// Returns the response body that accompanied the failure.
    pub fn body(&self) -> &Value {
        match self {
            Self::Validation { messages, .. }
            | Self::Unauthorized { messages, .. }
            | Self::NotFound { messages, .. } => messages,
            Self::Fatal { message, .. } => message,
        }
    }

    /// `true` for validation-class errors (`400` and `401`).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Unauthorized { .. })
    }

    /// Renders the conventional error object handed to ORM callers.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Validation {
                status_code,
                messages,
            } => json!({
                "statusCode": status_code,
                "type": ErrorKind::Validation.code(),
                "validation": true,
                "messages": messages,
            }),
            Self::Unauthorized {
                status_code,
                messages,
            } => json!({
                "statusCode": status_code,
                "type": ErrorKind::Unauthorized.code(),
                "unauthorized": true,
                "validation": true,
                "messages": messages,
            }),
            Self::NotFound {
                status_code,
                messages,
            } => json!({
                "statusCode": status_code,
                "type": ErrorKind::NotFound.code(),
                "notFound": true,
                "messages": messages,
            }),
            Self::Fatal {
                status_code,
                message,
            } => json!({
                "statusCode": status_code,
                "type": ErrorKind::Fatal.code(),
                "fatal": true,
                "message": message,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Errors from registering a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The connection has no identity (absent, empty or blank).
    #[error("Connection is missing an identity")]
    IdentityMissing,

    /// Another live connection already uses this identity.
    #[error("Connection identity '{identity}' is already registered")]
    IdentityDuplicate { identity: String },
}

// ---------------------------------------------------------------------------
// Caller-contract violations
// ---------------------------------------------------------------------------

/// A malformed association command, detected before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractError {
    /// No scalar `id` for the parent record.
    #[error("Association command requires the parent record 'id'")]
    MissingRecordId,

    /// No `association` attribute name.
    #[error("Association command requires an 'association' name")]
    MissingAssociation,

    /// Neither `foreignId` nor `foreignData` was supplied.
    #[error("Association command requires either 'foreignId' or 'foreignData'")]
    MissingForeignTarget,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Failures of the socket itself, as opposed to failure statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The socket could not be opened.
    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    /// A request was attempted on a transport that has been disconnected.
    #[error("Socket is not connected")]
    NotConnected,

    /// The socket closed before the response arrived.
    #[error("Socket disconnected before a response arrived")]
    Disconnected,

    /// A frame could not be encoded or decoded.
    #[error("Malformed frame: {0}")]
    Codec(String),

    /// Writing to the socket failed.
    #[error("Failed to send frame: {0}")]
    Send(String),
}
