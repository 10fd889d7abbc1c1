//! Raw upstream responses and the panel's `{status, data}` envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PanelError, Result};

/// Status code the panel reports for a successful call
pub const SUCCESS_STATUS: u16 = 200;

/// Raw result of one call against the panel: HTTP status and decoded body
///
/// Bodies that are not JSON are carried as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Check the HTTP status and the envelope status, then return `data`
    ///
    /// A body without an envelope is returned whole.
    pub fn into_data(self) -> Result<Value> {
        if self.status != SUCCESS_STATUS {
            return Err(PanelError::Status {
                status: self.status,
                message: failure_message(&self.body),
            });
        }

        // Any numeric envelope status other than 200 is a failure, including
        // values that do not fit an HTTP status code
        if let Some(raw) = self.body.get("status").filter(|s| s.is_number()) {
            if raw.as_u64() != Some(u64::from(SUCCESS_STATUS)) {
                let message = failure_message(&self.body);
                return Err(match raw.as_u64().and_then(|s| u16::try_from(s).ok()) {
                    Some(status) => PanelError::Status { status, message },
                    None => PanelError::Http(format!(
                        "Panel envelope carried status {}: {}",
                        raw, message
                    )),
                });
            }
        }

        match self.body {
            Value::Object(mut map) if map.contains_key("data") => {
                Ok(map.remove("data").unwrap_or(Value::Null))
            }
            body => Ok(body),
        }
    }
}

/// Best human-readable reason the panel gave for a failure
fn failure_message(body: &Value) -> String {
    match body {
        Value::String(text) if !text.is_empty() => text.clone(),
        Value::Object(map) => match map.get("data") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => "request rejected".to_string(),
            Some(other) => other.to_string(),
        },
        Value::Null => "empty response".to_string(),
        other => other.to_string(),
    }
}
