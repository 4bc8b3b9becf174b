//! JSON frame encoding.
//!
//! Each request travels as one text message carrying a fresh correlation id;
//! the server echoes that id on the matching response. Responses may arrive
//! in any order.

use std::collections::BTreeMap;

use protocol::{Method, TransportError, WireRequest, WireResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: Uuid,
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl RequestFrame {
    pub fn new(id: Uuid, request: WireRequest, headers: BTreeMap<String, String>) -> Self {
        Self {
            id,
            method: request.method,
            url: request.url,
            data: request.data,
            headers,
        }
    }
}

/// Inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFrame {
    pub id: Uuid,
    pub status_code: u16,
    #[serde(default)]
    pub body: Value,
}

impl ResponseFrame {
    pub fn into_response(self) -> WireResponse {
        WireResponse::new(self.status_code, self.body)
    }
}

pub fn encode_request(frame: &RequestFrame) -> Result<String, TransportError> {
    serde_json::to_string(frame).map_err(|e| TransportError::Codec(e.to_string()))
}

pub fn decode_response(text: &str) -> Result<ResponseFrame, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::Codec(e.to_string()))
}
