//! Socket Bus - WebSocket client messaging core.
//!
//! This library connects to a single remote agent over WebSocket and
//! layers request/response correlation, broadcast events and
//! peer-initiated method calls on top of one reconnecting socket.
//!
//! # Architecture
//!
//! Two layers, each with one job:
//!
//! - **Transport**: Owns the socket, reconnects with exponential backoff,
//!   buffers frames sent while disconnected and flushes them in order
//! - **Message bus**: Correlates requests with responses by id, fans
//!   events out to listeners, answers the peer's requests
//!
//! Every message on the wire is one JSON [`Frame`] with a `type` of
//! `request`, `response` or `event`.
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use socket_bus::{Client, ClientConfig, Result, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::new(TransportConfig::new("ws://127.0.0.1:3000/ws")?);
//!     let client = Client::new(config);
//!
//!     client.on_event("textDelta", |data| print!("{data}"));
//!     client.connect().await?;
//!
//!     let reply = client.request("ping", json!({})).await?;
//!     println!("{reply}");
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bus`] | [`MessageBus`]: correlation, events, method handlers |
//! | [`client`] | [`Client`] facade owning transport and bus |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Request ids and subscription handles |
//! | [`protocol`] | Wire frame types |
//! | [`transport`] | Reconnecting WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Request correlation and inbound dispatch.
///
/// Use [`MessageBus::set_transport`] to attach a [`Transport`].
pub mod bus;

/// High-level client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Request ids and subscription handles.
pub mod identifiers;

/// Wire frame types.
///
/// Defines the `request`/`response`/`event` JSON envelopes.
pub mod protocol;

/// Reconnecting WebSocket transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bus types
pub use bus::{BusConfig, EventListener, MessageBus, MethodHandler};

// Client types
pub use client::{Client, ClientConfig};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ListenerId, RequestId, SubscriptionId};

// Protocol types
pub use protocol::{
    ApprovalCategory, ApprovalOption, EventFrame, Frame, RequestFrame, ResponseError,
    ResponseFrame, TOOL_APPROVAL_METHOD, ToolApprovalParams, ToolApprovalResult, ToolUse,
};

// Transport types
pub use transport::{
    Backoff, Transport, TransportConfig, TransportConfigBuilder, TransportState,
    WebSocketTransport,
};
