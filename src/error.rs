//! Error types for the messaging core.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use socket_bus::{MessageBus, Result};
//!
//! async fn example(bus: &MessageBus) -> Result<()> {
//!     let status = bus.request("session.getStatus", serde_json::json!({})).await?;
//!     println!("{status}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::NotConnected`], [`Error::TransportClosed`] |
//! | Request | [`Error::Remote`], [`Error::Cancelled`], [`Error::RequestTimeout`], [`Error::Handler`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when transport or client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the first connection attempt cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Send attempted while the socket is not open.
    ///
    /// The frame was buffered and will be retried on the next reconnect,
    /// but the call itself did not deliver anything.
    #[error("Transport is not connected")]
    NotConnected,

    /// Transport was explicitly closed and will not reconnect.
    #[error("Transport is closed")]
    TransportClosed,

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Error reported by the remote peer in a response frame.
    #[error("Remote error: {message}")]
    Remote {
        /// Message carried in the response's `error` payload.
        message: String,
    },

    /// Request was cancelled before a response arrived.
    #[error("Request cancelled")]
    Cancelled,

    /// Request did not receive a response in time.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Local handler for a peer-initiated request failed.
    #[error("Handler error: {message}")]
    Handler {
        /// Description of the handler failure.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a handler error.
    #[inline]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
                | Self::TransportClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry once the transport
    /// has reconnected.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::RequestTimeout { .. }
                | Self::NotConnected
                | Self::ConnectionClosed
        )
    }

    /// Returns the message to put in an error response frame.
    ///
    /// Handler and remote errors carry their message verbatim; everything
    /// else uses its display form.
    #[must_use]
    pub fn reply_message(&self) -> String {
        match self {
            Self::Handler { message } | Self::Remote { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing url");
        assert_eq!(err.to_string(), "Configuration error: missing url");
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(Error::NotConnected.to_string(), "Transport is not connected");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout(RequestId::from("r1"), 500);
        let other_err = Error::Cancelled;

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::TransportClosed.is_connection_error());
        assert!(!Error::remote("boom").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::NotConnected.is_recoverable());
        assert!(!Error::TransportClosed.is_recoverable());
        assert!(!Error::Cancelled.is_recoverable());
    }

    #[test]
    fn test_reply_message() {
        assert_eq!(Error::handler("nope").reply_message(), "nope");
        assert_eq!(Error::remote("bad").reply_message(), "bad");
        assert_eq!(Error::Cancelled.reply_message(), "Request cancelled");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
