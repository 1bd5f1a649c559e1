//! High-level client owning one transport and one message bus.
//!
//! [`Client`] wires a fresh [`WebSocketTransport`] into its [`MessageBus`]
//! on every [`connect`](Client::connect), so listeners and method handlers
//! registered on the client survive every reconnect and `disconnect`.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use socket_bus::{Client, ClientConfig, TransportConfig};
//!
//! # async fn example() -> socket_bus::Result<()> {
//! let client = Client::new(ClientConfig::new(TransportConfig::new("ws://127.0.0.1:3000/ws")?));
//!
//! client.on_tool_approval(|tool, category| async move {
//!     println!("{} ({category:?})", tool.name);
//!     Ok(true)
//! });
//! client.connect().await?;
//!
//! let session = client.request("session.create", json!({})).await?;
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bus::{BusConfig, DEFAULT_REQUEST_TIMEOUT, MessageBus};
use crate::error::Result;
use crate::identifiers::ListenerId;
use crate::protocol::{
    ApprovalCategory, TOOL_APPROVAL_METHOD, ToolApprovalParams, ToolApprovalResult, ToolUse,
};
use crate::transport::{TransportConfig, TransportState, WebSocketTransport};

// ============================================================================
// ClientConfig
// ============================================================================

/// Settings for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint and reconnect policy.
    pub transport: TransportConfig,

    /// Per-request response timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a configuration with the default request timeout.
    #[must_use]
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Disables the per-request timeout.
    #[inline]
    #[must_use]
    pub fn without_request_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    fn bus_config(&self) -> BusConfig {
        match self.request_timeout {
            Some(timeout) => BusConfig::new().with_request_timeout(timeout),
            None => BusConfig::new().without_request_timeout(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Connection facade over a [`MessageBus`].
///
/// Cloning is cheap and all clones share the same bus and transport.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    bus: MessageBus,
    transport: Mutex<Option<WebSocketTransport>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.config.transport.url().as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Creates a disconnected client.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let bus = MessageBus::with_config(config.bus_config());
        Self {
            inner: Arc::new(ClientInner {
                config,
                bus,
                transport: Mutex::new(None),
            }),
        }
    }

    /// Returns the client configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the underlying message bus.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.inner.bus
    }

    /// Connects to the configured endpoint.
    ///
    /// No-op if already connected. Otherwise any previous transport is
    /// closed and a fresh one is attached to the bus.
    ///
    /// # Errors
    ///
    /// Returns the transport's connection error; the client stays in the
    /// [`TransportState::Error`] state.
    pub async fn connect(&self) -> Result<()> {
        let (transport, previous) = {
            let mut slot = self.inner.transport.lock();
            if slot.as_ref().is_some_and(WebSocketTransport::is_connected) {
                return Ok(());
            }

            let transport = WebSocketTransport::new(self.inner.config.transport.clone());
            transport.on_error(|e| warn!(error = %e, "Transport error"));
            transport.on_close(|| debug!("Transport closed"));

            let previous = slot.replace(transport.clone());
            (transport, previous)
        };

        if let Some(previous) = previous {
            previous.close().await;
        }

        self.inner.bus.set_transport(transport.clone());
        transport.connect().await?;

        info!(url = %self.inner.config.transport.url(), "Client connected");
        Ok(())
    }

    /// Closes the transport and cancels every pending request.
    ///
    /// Registered listeners and handlers are kept for the next connect.
    pub async fn disconnect(&self) {
        let transport = self.inner.transport.lock().take();

        if let Some(transport) = transport {
            transport.close().await;
        }

        let cancelled = self.inner.bus.cancel_pending_requests();
        debug!(cancelled, "Client disconnected");
    }

    /// Returns the current connection state.
    ///
    /// [`TransportState::Disconnected`] before the first connect and after
    /// [`disconnect`](Self::disconnect).
    #[must_use]
    pub fn state(&self) -> TransportState {
        self.inner
            .transport
            .lock()
            .as_ref()
            .map_or(TransportState::Disconnected, WebSocketTransport::state)
    }

    /// Returns `true` if the transport is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.bus.is_transport_connected()
    }
}

// ============================================================================
// Client - Messaging
// ============================================================================

impl Client {
    /// Sends a request and waits for its result.
    ///
    /// # Errors
    ///
    /// See [`MessageBus::request`].
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.inner.bus.request(method, params).await
    }

    /// Sends a typed request and deserializes its result.
    ///
    /// # Errors
    ///
    /// See [`MessageBus::call`].
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.inner.bus.call(method, params).await
    }

    /// Appends an event listener.
    pub fn on_event<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.bus.on_event(event, listener)
    }

    /// Removes an event listener.
    pub fn remove_event_handler(&self, event: &str, id: ListenerId) -> bool {
        self.inner.bus.remove_event_handler(event, id)
    }

    /// Installs the answer to the peer's `toolApproval` requests.
    ///
    /// The handler decides whether a tool invocation may run. Malformed
    /// params and handler errors are sent back as error responses.
    pub fn on_tool_approval<F, Fut>(&self, handler: F)
    where
        F: Fn(ToolUse, ApprovalCategory) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let handler = Arc::new(handler);

        self.inner
            .bus
            .register_handler(TOOL_APPROVAL_METHOD, move |params: Value| {
                let handler = Arc::clone(&handler);
                async move {
                    let ToolApprovalParams { tool_use, category } = serde_json::from_value(params)?;
                    debug!(tool = %tool_use.name, ?category, "Tool approval requested");

                    let approved = handler(tool_use, category).await?;
                    Ok(serde_json::to_value(ToolApprovalResult::new(approved))?)
                }
            });
    }
}

// ============================================================================
// Tests
// ============================================================================
