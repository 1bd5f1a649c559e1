//! WebSocket transport layer.
//!
//! This module owns the single socket to the remote agent and hides
//! reconnection behind a stable interface. It deals only in opaque
//! [`Frame`](crate::Frame)s and knows nothing about request correlation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  MessageBus     │                              │  Remote agent   │
//! │       │         │         WebSocket            │                 │
//! │  WebSocket-     │◄────────────────────────────►│  /ws endpoint   │
//! │  Transport      │      reconnect w/ backoff    │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `WebSocketTransport::new` - Disconnected, nothing spawned
//! 2. `WebSocketTransport::connect` - First attempt, surfaced to the caller
//! 3. Supervisor task - Reads, writes, reconnects with exponential backoff
//! 4. `WebSocketTransport::close` - Terminal; no further reconnects
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backoff` | Reconnect delay policy |
//! | `config` | Endpoint and reconnect configuration |
//! | `connection` | Socket supervisor and transmit buffer |
//! | `handlers` | Subscriber lists |
//! | `traits` | [`Transport`] contract used by the bus |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnect delay policy.
pub mod backoff;

/// Endpoint and reconnect configuration.
pub mod config;

/// Socket supervisor and transmit buffer.
pub mod connection;

/// Subscriber lists.
pub mod handlers;

/// Transport contract.
pub mod traits;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::Backoff;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use connection::{TransportState, WebSocketTransport};
pub use handlers::{CloseHandler, ErrorHandler, MessageHandler};
pub use traits::Transport;
