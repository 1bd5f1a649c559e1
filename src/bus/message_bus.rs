//! Request/response correlation and event dispatch.
//!
//! The bus sits above exactly one [`Transport`]. Outgoing requests get a
//! fresh [`RequestId`] and a pending entry; the matching `response` frame
//! resolves it. Inbound `event` frames fan out to listeners, and inbound
//! `request` frames go to the registered method handler, whose result is
//! sent back as a `response`.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use socket_bus::{MessageBus, TransportConfig, WebSocketTransport};
//!
//! # async fn example() -> socket_bus::Result<()> {
//! let transport = WebSocketTransport::new(TransportConfig::new("ws://127.0.0.1:3000/ws")?);
//! let bus = MessageBus::new();
//! bus.set_transport(transport.clone());
//! transport.connect().await?;
//!
//! bus.on_event("textDelta", |data| println!("delta: {data}"));
//! bus.register_handler("echo", |params| async move { Ok(params) });
//!
//! let models = bus.request("models.list", json!({})).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, RequestId, SubscriptionId, duration_millis};
use crate::protocol::{EventFrame, Frame, RequestFrame, ResponseFrame};
use crate::transport::Transport;

use super::config::BusConfig;
use super::registry::{EventRegistry, MethodHandler, MethodRegistry};

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to response channels.
type PendingMap = FxHashMap<RequestId, oneshot::Sender<Result<Value>>>;

/// The attached transport and our subscription on it.
struct Attached {
    transport: Arc<dyn Transport>,
    subscription: SubscriptionId,
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Removes a pending entry when the awaiting request finishes or is dropped.
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingMap>,
    id: &'a RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(self.id);
    }
}

// ============================================================================
// MessageBus
// ============================================================================

/// Correlates requests with responses and dispatches events and
/// peer-initiated calls.
///
/// Cloning is cheap and all clones share the same pending table and
/// registries.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    config: BusConfig,
    transport: Mutex<Option<Attached>>,
    pending: Mutex<PendingMap>,
    events: EventRegistry,
    methods: MethodRegistry,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("config", &self.inner.config)
            .field("pending", &self.pending_requests_count())
            .field("connected", &self.is_transport_connected())
            .finish()
    }
}

// ============================================================================
// MessageBus - Constructor
// ============================================================================

impl MessageBus {
    /// Creates a bus with the default configuration and no transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus with a custom configuration.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                config,
                transport: Mutex::new(None),
                pending: Mutex::new(PendingMap::default()),
                events: EventRegistry::default(),
                methods: MethodRegistry::default(),
            }),
        }
    }

    /// Returns the bus configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }
}

// ============================================================================
// MessageBus - Transport
// ============================================================================

impl MessageBus {
    /// Attaches a transport, replacing any previous one.
    pub fn set_transport<T>(&self, transport: T)
    where
        T: Transport + 'static,
    {
        self.attach(Arc::new(transport));
    }

    /// Attaches a shared transport, replacing any previous one.
    ///
    /// The previous transport's inbound frames are no longer dispatched.
    pub fn attach(&self, transport: Arc<dyn Transport>) {
        let weak: Weak<BusInner> = Arc::downgrade(&self.inner);
        let subscription = transport.on_message(Arc::new(move |frame: &Frame| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_incoming(frame);
            }
        }));

        let previous = self.inner.transport.lock().replace(Attached {
            transport,
            subscription,
        });

        if let Some(previous) = previous {
            previous.transport.remove_handler(previous.subscription);
            debug!("Replaced message bus transport");
        }
    }

    /// Returns `true` if a transport is attached and connected.
    #[must_use]
    pub fn is_transport_connected(&self) -> bool {
        self.inner
            .current_transport()
            .is_some_and(|transport| transport.is_connected())
    }
}

// ============================================================================
// MessageBus - Requests
// ============================================================================

impl MessageBus {
    /// Sends a request and waits for its response, bounded by the
    /// configured request timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no transport is attached or it is not connected
    /// - Any error from the transport's `send`
    /// - [`Error::Remote`] if the peer answered with an error
    /// - [`Error::Cancelled`] if [`cancel_pending_requests`](Self::cancel_pending_requests) ran first
    /// - [`Error::RequestTimeout`] if no response arrived in time
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.request_with_timeout(method, params, self.inner.config.request_timeout)
            .await
    }

    /// Sends a request with an explicit timeout. `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn request_with_timeout(
        &self,
        method: &str,
        params: Value,
        request_timeout: Option<Duration>,
    ) -> Result<Value> {
        let transport = match self.inner.current_transport() {
            Some(transport) if transport.is_connected() => transport,
            _ => return Err(Error::NotConnected),
        };

        let id = RequestId::generate();
        let (response_tx, response_rx) = oneshot::channel();

        // Store correlation before sending
        self.inner.pending.lock().insert(id.clone(), response_tx);
        let _guard = PendingGuard {
            pending: &self.inner.pending,
            id: &id,
        };

        trace!(request_id = %id, method, "Sending request");
        transport
            .send(Frame::request(id.clone(), method, params))
            .await?;

        let outcome = match request_timeout {
            Some(limit) => match timeout(limit, response_rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(request_id = %id, method, "Request timed out");
                    return Err(Error::request_timeout(
                        id.clone(),
                        duration_millis(limit),
                    ));
                }
            },
            None => response_rx.await,
        };

        match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Cancelled),
        }
    }

    /// Sends a typed request and deserializes the result.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request), plus [`Error::Json`] if the
    /// params or result do not fit the given types.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        let result = self.request(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Rejects every pending request with [`Error::Cancelled`].
    ///
    /// Listener and handler registries are untouched. Returns the number
    /// of requests cancelled.
    pub fn cancel_pending_requests(&self) -> usize {
        let pending: Vec<_> = self.inner.pending.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::Cancelled));
        }

        if count > 0 {
            debug!(count, "Cancelled pending requests");
        }
        count
    }

    /// Returns the number of requests awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_requests_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

// ============================================================================
// MessageBus - Events & Handlers
// ============================================================================

impl MessageBus {
    /// Appends a listener for an event name.
    ///
    /// All listeners for a name run in registration order on every
    /// matching event.
    pub fn on_event<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.events.add(event.into(), Arc::new(listener))
    }

    /// Removes one listener. Returns `false` if it was not registered.
    pub fn remove_event_handler(&self, event: &str, id: ListenerId) -> bool {
        self.inner.events.remove(event, id)
    }

    /// Returns the number of listeners for an event name.
    #[must_use]
    pub fn event_listener_count(&self, event: &str) -> usize {
        self.inner.events.count(event)
    }

    /// Installs the handler for a peer-initiated method, replacing any
    /// earlier one.
    ///
    /// A handler error is sent back as the response's `error.message`.
    pub fn register_handler<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let method = method.into();
        let handler: MethodHandler = Arc::new(move |params| handler(params).boxed());

        if self.inner.methods.insert(method.clone(), handler) {
            debug!(method, "Replaced method handler");
        }
    }

    /// Removes the handler for a method. Returns `false` if none was set.
    pub fn remove_message_handler(&self, method: &str) -> bool {
        self.inner.methods.remove(method)
    }
}

// ============================================================================
// BusInner - Dispatch
// ============================================================================

impl BusInner {
    fn current_transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport
            .lock()
            .as_ref()
            .map(|attached| Arc::clone(&attached.transport))
    }

    fn handle_incoming(self: &Arc<Self>, frame: &Frame) {
        match frame {
            Frame::Response(response) => self.handle_response(response.clone()),
            Frame::Event(event) => self.handle_event(event),
            Frame::Request(request) => self.handle_request(request.clone()),
        }
    }

    fn handle_response(&self, response: ResponseFrame) {
        let tx = self.pending.lock().remove(&response.id);

        match tx {
            Some(tx) => {
                trace!(request_id = %response.id, "Response received");
                let _ = tx.send(response.into_result());
            }
            None => debug!(request_id = %response.id, "Response for unknown request"),
        }
    }

    fn handle_event(&self, event: &EventFrame) {
        let invoked = self.events.emit(&event.event, &event.data);
        trace!(event = %event.event, invoked, "Event dispatched");
    }

    fn handle_request(self: &Arc<Self>, request: RequestFrame) {
        let Some(handler) = self.methods.get(&request.method) else {
            debug!(method = %request.method, "No handler for inbound request, dropping");
            return;
        };

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let RequestFrame { id, method, params, .. } = request;

            let reply = match AssertUnwindSafe(handler(params)).catch_unwind().await {
                Ok(Ok(result)) => Frame::success(id, result),
                Ok(Err(e)) => {
                    debug!(method, error = %e, "Method handler failed");
                    Frame::failure(id, e.reply_message())
                }
                Err(_) => {
                    warn!(method, "Method handler panicked");
                    Frame::failure(id, format!("Handler for '{method}' panicked"))
                }
            };

            inner.reply(reply).await;
        });
    }

    async fn reply(&self, frame: Frame) {
        let Some(transport) = self.current_transport() else {
            warn!("No transport attached, dropping response");
            return;
        };

        if let Err(e) = transport.send(frame).await {
            warn!(error = %e, "Failed to send response");
        }
    }
}

impl Drop for BusInner {
    fn drop(&mut self) {
        if let Some(attached) = self.transport.get_mut().take() {
            attached.transport.remove_handler(attached.subscription);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
