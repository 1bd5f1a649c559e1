//! Transport contract consumed by the message bus.
//!
//! The bus only needs to push frames out, check liveness, and receive
//! inbound frames. [`WebSocketTransport`](super::WebSocketTransport) is the
//! production implementation; tests plug in in-memory ones.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::SubscriptionId;
use crate::protocol::Frame;

use super::MessageHandler;

// ============================================================================
// Transport
// ============================================================================

/// A single logical connection carrying opaque frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transmits a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`](crate::Error::NotConnected) if the
    /// frame could not be handed to an open socket. Implementations may
    /// buffer it for a later reconnect, but the call still fails.
    async fn send(&self, frame: Frame) -> Result<()>;

    /// Returns `true` if frames sent now would reach an open socket.
    fn is_connected(&self) -> bool;

    /// Subscribes to inbound frames.
    fn on_message(&self, handler: MessageHandler) -> SubscriptionId;

    /// Removes a subscription. Returns `false` if it was not registered.
    fn remove_handler(&self, id: SubscriptionId) -> bool;
}
