//! Request/response messaging over a transport.
//!
//! The bus turns the transport's raw frames into three interaction
//! patterns: awaited requests, broadcast events and peer-initiated calls.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Request timeout settings |
//! | `message_bus` | [`MessageBus`] and inbound dispatch |
//! | `registry` | Event listener and method handler tables |

// ============================================================================
// Submodules
// ============================================================================

/// Request timeout settings.
pub mod config;

/// Request correlation and inbound dispatch.
pub mod message_bus;

/// Event listener and method handler tables.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{BusConfig, DEFAULT_REQUEST_TIMEOUT};
pub use message_bus::MessageBus;
pub use registry::{EventListener, MethodHandler};
