//! Shared value types for the Sockline domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! configuration and wire payloads: the connection settings, the verbs a socket
//! understands, and the request/response envelopes exchanged over it.

use std::collections::BTreeMap;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters escaped inside one path segment. `/` is included so a key such
/// as `a/b` stays a single segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// ---------------------------------------------------------------------------
// Connection configuration
// ---------------------------------------------------------------------------

/// Scheme used to reach the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    /// Returns the scheme as it appears in a URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// Settings for one connection. Immutable once a connection is constructed.
///
/// Deserialises from the camel-cased keys used in configuration files; every
/// field is optional and falls back to a local development server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    /// `http` or `https`.
    pub protocol: Protocol,

    /// Server host name.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Prefix for every resource path, e.g. `/api`.
    #[serde(alias = "pathname")]
    pub base_path: String,

    /// Open the socket at construction time. When `false` the socket is opened
    /// by the first request.
    pub auto_connect: bool,

    /// Artificial latency (milliseconds) added before every operation.
    ///
    /// Development aid only; ignored in [`ExecutionMode::Production`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulate_delay: Option<u64>,

    /// Headers sent with every request frame.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            host: "localhost".to_owned(),
            port: 1337,
            base_path: "/api".to_owned(),
            auto_connect: true,
            simulate_delay: None,
            headers: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Returns the server origin, e.g. `http://localhost:1337`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Joins `segments` onto the base path, percent-encoding each segment.
    ///
    /// A trailing slash on the base path is ignored, so `/api/` and `/api`
    /// produce the same resource paths.
    pub fn resource_path(&self, segments: &[&str]) -> String {
        let mut path = self.base_path.trim_end_matches('/').to_owned();
        for segment in segments {
            path.push('/');
            path.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        path
    }

    /// Returns the delay to inject before each operation, if any.
    ///
    /// Always `None` in production, and for a configured delay of zero.
    pub fn simulated_delay(&self, mode: ExecutionMode) -> Option<Duration> {
        if mode.is_production() {
            return None;
        }
        self.simulate_delay
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------

/// Execution mode of the host application.
///
/// Only affects development instrumentation such as simulated latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Development,
    Production,
}

impl ExecutionMode {
    /// Parses an environment name. `production` (or `prod`), in any case, is
    /// production; everything else is development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Returns `true` for [`ExecutionMode::Production`].
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Opaque collection definition supplied at registration time.
///
/// The server owns the real schema; this copy is only handed back by
/// `describe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionSchema(Value);

impl CollectionSchema {
    /// Wraps a definition.
    pub fn new(definition: Value) -> Self {
        Self(definition)
    }

    /// Returns the definition.
    pub fn definition(&self) -> &Value {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// Verbs understood by the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the lowercase verb name used in frames.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unsupported socket method '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------

/// One request to be sent over a socket.
///
/// `data` is the query payload for `get`/`delete` and the JSON body otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub data: Value,
}

impl WireRequest {
    pub fn new(method: Method, url: impl Into<String>, data: Value) -> Self {
        Self {
            method,
            url: url.into(),
            data,
        }
    }
}

/// The transport's answer to one [`WireRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResponse {
    pub status_code: u16,
    #[serde(default)]
    pub body: Value,
}

impl WireResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// Returns `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Normalises a response body into a record list.
///
/// Arrays yield their elements, `null` yields nothing, and any other value is
/// treated as a single record (single-record routes answer with an object).
pub fn into_records(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
