//! Request and Response frame types.
//!
//! A `request` frame asks the peer to run a method; the peer answers with
//! exactly one `response` frame carrying the same `id`. Both directions
//! use the same shapes: the local bus issues requests, and the remote end
//! may call registered local handlers.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, now_millis};

// ============================================================================
// RequestFrame
// ============================================================================

/// A method call.
///
/// # Format
///
/// ```json
/// {
///   "type": "request",
///   "id": "1718000000000-0-a1b2c3d4e",
///   "method": "config.get",
///   "params": { ... },
///   "timestamp": 1718000000000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Method name.
    pub method: String,

    /// Method parameters.
    #[serde(default)]
    pub params: Value,

    /// Creation time in epoch milliseconds (diagnostics only).
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub timestamp: u64,
}

impl RequestFrame {
    /// Creates a new request frame stamped with the current time.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
            timestamp: now_millis(),
        }
    }
}

// ============================================================================
// ResponseFrame
// ============================================================================

/// The answer to a [`RequestFrame`].
///
/// # Format
///
/// Success:
/// ```json
/// { "type": "response", "id": "...", "result": { ... }, "timestamp": 0 }
/// ```
///
/// Error:
/// ```json
/// { "type": "response", "id": "...", "error": { "message": "..." }, "timestamp": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error payload (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    /// Creation time in epoch milliseconds (diagnostics only).
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub timestamp: u64,
}

impl ResponseFrame {
    /// Creates a successful response.
    #[inline]
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
            timestamp: now_millis(),
        }
    }

    /// Creates an error response.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ResponseError {
                message: message.into(),
            }),
            timestamp: now_millis(),
        }
    }

    /// Returns `true` if this response carries an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if the peer reported one.
    ///
    /// A success response without a `result` yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the response carries an error.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) if error.message.is_empty() => Err(Error::remote("unknown error")),
            Some(error) => Err(Error::remote(error.message)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// ResponseError
// ============================================================================

/// Error payload of a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Human-readable failure description.
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = RequestFrame::new(RequestId::from("r1"), "config.get", json!({"key": "model"}));
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(value["id"], "r1");
        assert_eq!(value["method"], "config.get");
        assert_eq!(value["params"]["key"], "model");
        assert!(value["timestamp"].as_u64().is_some_and(|t| t > 0));
    }

    #[test]
    fn test_request_missing_params_is_null() {
        let request: RequestFrame =
            serde_json::from_str(r#"{"id": "r1", "method": "ping"}"#).expect("parse");

        assert_eq!(request.params, Value::Null);
        assert_eq!(request.timestamp, 0);
    }

    #[test]
    fn test_success_response_omits_error() {
        let response = ResponseFrame::success(RequestId::from("r1"), json!("pong"));
        let value = serde_json::to_value(&response).expect("serialize");

        assert_eq!(value["result"], "pong");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_response() {
        let json_str = r#"{
            "id": "r2",
            "error": { "message": "Session not found" },
            "timestamp": 1
        }"#;

        let response: ResponseFrame = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_error());

        let err = response.into_result().expect_err("should fail");
        assert!(matches!(err, Error::Remote { ref message } if message == "Session not found"));
    }

    #[test]
    fn test_error_response_without_message() {
        let response: ResponseFrame =
            serde_json::from_str(r#"{"id": "r3", "error": {}}"#).expect("parse");

        let err = response.into_result().expect_err("should fail");
        assert_eq!(err.reply_message(), "unknown error");
    }

    #[test]
    fn test_into_result_without_result_is_null() {
        let response: ResponseFrame = serde_json::from_str(r#"{"id": "r4"}"#).expect("parse");
        assert_eq!(response.into_result().expect("ok"), Value::Null);
    }
}
