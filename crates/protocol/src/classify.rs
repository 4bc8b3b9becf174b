//! Maps transport responses onto the [`AdapterError`] taxonomy.

use serde_json::Value;

use crate::{AdapterError, WireResponse};

/// Classifies a status code and body.
///
/// Returns `None` for any 2xx status. `400`, `401` and `404` get dedicated
/// variants; every other status is [`AdapterError::Fatal`]. The body is copied
/// into the error unchanged.
pub fn classify(status_code: u16, body: &Value) -> Option<AdapterError> {
    let body = body.clone();
    match status_code {
        200..=299 => None,
        400 => Some(AdapterError::Validation {
            status_code,
            messages: body,
        }),
        401 => Some(AdapterError::Unauthorized {
            status_code,
            messages: body,
        }),
        404 => Some(AdapterError::NotFound {
            status_code,
            messages: body,
        }),
        _ => Some(AdapterError::Fatal {
            status_code,
            message: body,
        }),
    }
}

impl WireResponse {
    /// Yields the body on success, or the classified error.
    pub fn into_result(self) -> Result<Value, AdapterError> {
        match classify(self.status_code, &self.body) {
            None => Ok(self.body),
            Some(err) => Err(err),
        }
    }
}
