//! Reconnecting WebSocket transport.
//!
//! This module owns the single socket to the remote endpoint, including
//! frame parsing, the transmit buffer and automatic reconnection.
//!
//! # Supervisor
//!
//! A successful [`WebSocketTransport::connect`] spawns one tokio task that
//! owns the socket for the rest of the transport's life:
//!
//! - Incoming messages are parsed and handed to `on_message` subscribers
//! - Outgoing frames arrive over an unbounded channel, in `send()` order
//! - On unexpected close it sleeps for the backoff delay and reconnects
//! - On [`WebSocketTransport::close`] it closes the socket and exits
//!
//! # Flush Ordering
//!
//! Draining the transmit buffer and switching to `Connected` happen under
//! the same lock that `send()` takes. A send either lands in the buffer
//! (and is flushed in order) or is queued after every flushed frame.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{SubscriptionId, duration_millis};
use crate::protocol::Frame;

use super::backoff::Backoff;
use super::config::TransportConfig;
use super::handlers::{HandlerList, MessageHandler};
use super::traits::Transport;

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream (plain or TLS).
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Receiving half of the outbound queue for one socket.
type OutboundRx = mpsc::UnboundedReceiver<Message>;

// ============================================================================
// TransportState
// ============================================================================

/// Connection state of a [`WebSocketTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// No socket; may be waiting for a reconnect attempt.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Socket open, frames flow.
    Connected,
    /// Last attempt or socket failed.
    Error,
    /// Explicitly closed. Terminal.
    Closed,
}

impl TransportState {
    /// Returns the lowercase state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` for [`TransportState::Closed`].
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Link
// ============================================================================

/// Mutable connection state guarded by one lock.
struct Link {
    state: TransportState,
    /// Bumped on every manual `connect()`; stale supervisors stop touching state.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    buffer: VecDeque<Frame>,
}

impl Link {
    fn is_open(&self) -> bool {
        self.state == TransportState::Connected
            && self.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

// ============================================================================
// Shared
// ============================================================================

/// State shared between transport handles and the supervisor task.
struct Shared {
    config: TransportConfig,
    link: Mutex<Link>,
    backoff: Mutex<Backoff>,
    message_handlers: HandlerList<dyn Fn(&Frame) + Send + Sync>,
    error_handlers: HandlerList<dyn Fn(&Error) + Send + Sync>,
    close_handlers: HandlerList<dyn Fn() + Send + Sync>,
    shutdown: watch::Sender<bool>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

/// Shuts the transport down once the last user handle is dropped.
///
/// The supervisor holds `Shared` but never a `Lifetime`, so dropping every
/// [`WebSocketTransport`] clone stops reconnection.
struct Lifetime(Arc<Shared>);

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.0.shut_down();
    }
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// One logical connection to one WebSocket endpoint.
///
/// Hides reconnection behind a stable interface. Cloning is cheap and all
/// clones share the same socket and subscriber lists.
///
/// # Example
///
/// ```no_run
/// use socket_bus::{Frame, TransportConfig, WebSocketTransport};
///
/// # async fn example() -> socket_bus::Result<()> {
/// let transport = WebSocketTransport::new(TransportConfig::new("ws://127.0.0.1:3000/ws")?);
/// transport.on_message(|frame: &Frame| println!("{}", frame.kind()));
/// transport.connect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WebSocketTransport {
    shared: Arc<Shared>,
    _lifetime: Arc<Lifetime>,
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.shared.config.url().as_str())
            .field("state", &self.state())
            .finish()
    }
}

impl WebSocketTransport {
    /// Creates a disconnected transport.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        let backoff = Backoff::new(config.reconnect_interval(), config.max_reconnect_interval());
        let (shutdown, _) = watch::channel(false);

        let shared = Arc::new(Shared {
            config,
            link: Mutex::new(Link {
                state: TransportState::Disconnected,
                generation: 0,
                outbound: None,
                buffer: VecDeque::new(),
            }),
            backoff: Mutex::new(backoff),
            message_handlers: HandlerList::default(),
            error_handlers: HandlerList::default(),
            close_handlers: HandlerList::default(),
            shutdown,
            supervisor: Mutex::new(None),
        });

        Self {
            _lifetime: Arc::new(Lifetime(Arc::clone(&shared))),
            shared,
        }
    }

    /// Opens the socket.
    ///
    /// Resolves once the socket is open for the first time. Later automatic
    /// reconnects happen in the background and are only observable through
    /// state and subscriptions. Calling this while connected is a no-op;
    /// calling it while a reconnect cycle is pending cancels that cycle and
    /// connects immediately.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportClosed`] if [`close`](Self::close) was called
    /// - [`Error::Connection`] if the handshake fails or is refused
    /// - [`Error::ConnectionTimeout`] if the attempt exceeds `connect_timeout`
    pub async fn connect(&self) -> Result<()> {
        let generation = {
            let mut link = self.shared.link.lock();
            match link.state {
                TransportState::Closed => return Err(Error::TransportClosed),
                TransportState::Connected if link.is_open() => return Ok(()),
                _ => {}
            }
            link.generation += 1;
            link.state = TransportState::Connecting;
            link.outbound = None;
            link.generation
        };

        if let Some(previous) = self.shared.supervisor.lock().take() {
            previous.abort();
        }

        info!(url = %self.shared.config.url(), "Connecting");

        let ws = match self.shared.open().await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(error = %e, "Initial connection failed");
                self.shared.set_state(generation, TransportState::Error);
                return Err(e);
            }
        };

        let Some(outbound_rx) = self.shared.install(generation) else {
            return Err(if self.shared.is_shut_down() {
                Error::TransportClosed
            } else {
                Error::ConnectionClosed
            });
        };

        let supervisor = tokio::spawn(Arc::clone(&self.shared).supervise(generation, ws, outbound_rx));
        *self.shared.supervisor.lock() = Some(supervisor);

        Ok(())
    }

    /// Transmits a frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the socket is not open; the frame is
    ///   buffered and flushed on the next successful reconnect
    /// - [`Error::TransportClosed`] after [`close`](Self::close); nothing is buffered
    /// - [`Error::Json`] if the frame cannot be serialized
    pub async fn send(&self, frame: Frame) -> Result<()> {
        self.shared.send(frame)
    }

    /// Closes the socket and disables reconnection. Idempotent.
    pub async fn close(&self) {
        self.shared.shut_down();
    }

    /// Returns `true` if the state is `Connected` and the socket is still open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.link.lock().is_open()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> TransportState {
        self.shared.link.lock().state
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        self.shared.config.url()
    }

    /// Returns the transport configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    /// Returns the number of frames waiting for a reconnect.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.shared.link.lock().buffer.len()
    }

    /// Returns the delay the next reconnect attempt would wait.
    #[must_use]
    pub fn next_reconnect_delay(&self) -> Duration {
        self.shared.backoff.lock().peek()
    }

    /// Subscribes to inbound frames.
    pub fn on_message<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.shared.message_handlers.add(Arc::new(handler))
    }

    /// Subscribes to transport-level errors (malformed frames, socket
    /// failures, failed reconnect attempts).
    pub fn on_error<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.shared.error_handlers.add(Arc::new(handler))
    }

    /// Subscribes to socket closure.
    pub fn on_close<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.close_handlers.add(Arc::new(handler))
    }

    /// Removes a subscription of any kind. Returns `false` if unknown.
    pub fn remove_handler(&self, id: SubscriptionId) -> bool {
        self.shared.message_handlers.remove(id)
            || self.shared.error_handlers.remove(id)
            || self.shared.close_handlers.remove(id)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, frame: Frame) -> Result<()> {
        self.shared.send(frame)
    }

    fn is_connected(&self) -> bool {
        WebSocketTransport::is_connected(self)
    }

    fn on_message(&self, handler: MessageHandler) -> SubscriptionId {
        self.shared.message_handlers.add(handler)
    }

    fn remove_handler(&self, id: SubscriptionId) -> bool {
        WebSocketTransport::remove_handler(self, id)
    }
}

// ============================================================================
// Shared - Link State
// ============================================================================

impl Shared {
    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Updates the state unless closed or superseded by a newer `connect()`.
    fn set_state(&self, generation: u64, state: TransportState) {
        let mut link = self.link.lock();
        if link.generation == generation && link.state != TransportState::Closed {
            link.state = state;
        }
    }

    /// Flushes the buffer into a fresh outbound queue and marks the link connected.
    ///
    /// Returns `None` if the transport was closed or superseded meanwhile.
    fn install(&self, generation: u64) -> Option<OutboundRx> {
        let (tx, rx) = mpsc::unbounded_channel();

        let flushed = {
            let mut link = self.link.lock();
            if link.generation != generation || link.state == TransportState::Closed {
                return None;
            }

            let flushed = link.buffer.len();
            while let Some(frame) = link.buffer.pop_front() {
                match frame.to_json() {
                    Ok(text) => {
                        let _ = tx.send(Message::Text(text.into()));
                    }
                    Err(e) => warn!(error = %e, "Dropping unserializable buffered frame"),
                }
            }

            link.outbound = Some(tx);
            link.state = TransportState::Connected;
            flushed
        };

        self.backoff.lock().reset();

        info!(url = %self.config.url(), flushed, "WebSocket connected");
        Some(rx)
    }

    /// Records a lost socket. Returns `false` if this supervisor is stale.
    fn mark_disconnected(&self, generation: u64) -> bool {
        let mut link = self.link.lock();
        if link.generation != generation {
            return false;
        }

        link.outbound = None;
        if link.state != TransportState::Closed {
            link.state = TransportState::Disconnected;
        }
        true
    }

    fn send(&self, frame: Frame) -> Result<()> {
        let text = frame.to_json()?;
        let mut link = self.link.lock();

        if link.state == TransportState::Closed {
            return Err(Error::TransportClosed);
        }

        if link.state == TransportState::Connected
            && let Some(tx) = &link.outbound
            && tx.send(Message::Text(text.into())).is_ok()
        {
            trace!(kind = frame.kind(), "Frame queued for write");
            return Ok(());
        }

        link.buffer.push_back(frame);
        debug!(buffered = link.buffer.len(), "Frame buffered while disconnected");
        Err(Error::NotConnected)
    }

    fn shut_down(&self) {
        self.shutdown.send_replace(true);

        let (previous, dropped) = {
            let mut link = self.link.lock();
            let previous = link.state;
            let dropped = link.buffer.len();
            link.state = TransportState::Closed;
            link.outbound = None;
            link.buffer.clear();
            (previous, dropped)
        };

        // The supervisor observes the shutdown signal and exits on its own.
        drop(self.supervisor.lock().take());

        if previous != TransportState::Closed {
            info!(url = %self.config.url(), dropped, "Transport closed");
        }
    }
}

// ============================================================================
// Shared - Supervisor
// ============================================================================

impl Shared {
    /// Opens one socket, bounded by the connect timeout.
    async fn open(&self) -> Result<WsStream> {
        let connect_timeout = self.config.connect_timeout();

        match timeout(connect_timeout, connect_async(self.config.url().as_str())).await {
            Ok(Ok((ws, _response))) => Ok(ws),
            Ok(Err(e)) => Err(Error::connection(e.to_string())),
            Err(_) => Err(Error::connection_timeout(duration_millis(connect_timeout))),
        }
    }

    /// Owns the socket across reconnects until closed or superseded.
    async fn supervise(self: Arc<Self>, generation: u64, ws: WsStream, outbound_rx: OutboundRx) {
        let mut shutdown = self.shutdown.subscribe();
        let mut ws = ws;
        let mut outbound_rx = outbound_rx;

        loop {
            self.run_connection(generation, ws, outbound_rx, &mut shutdown)
                .await;

            if !self.mark_disconnected(generation) {
                debug!("Supervisor superseded");
                return;
            }

            self.close_handlers.emit(|handler| handler());

            if self.is_shut_down() || !self.config.should_reconnect() {
                debug!("Reconnection disabled, supervisor exiting");
                return;
            }

            match self.reconnect(generation, &mut shutdown).await {
                Some((next_ws, next_rx)) => {
                    ws = next_ws;
                    outbound_rx = next_rx;
                }
                None => return,
            }
        }
    }

    /// Retries with exponential backoff until a socket opens or the transport closes.
    async fn reconnect(
        &self,
        generation: u64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<(WsStream, OutboundRx)> {
        loop {
            let delay = self.backoff.lock().next_delay();
            debug!(delay_ms = duration_millis(delay), "Scheduling reconnect");

            tokio::select! {
                () = sleep(delay) => {}
                _ = shutdown.changed() => {
                    debug!("Reconnect cancelled by close");
                    return None;
                }
            }

            if self.is_shut_down() {
                return None;
            }

            self.set_state(generation, TransportState::Connecting);

            let attempt = tokio::select! {
                result = self.open() => result,
                _ = shutdown.changed() => return None,
            };

            match attempt {
                Ok(ws) => {
                    let outbound_rx = self.install(generation)?;
                    return Some((ws, outbound_rx));
                }
                Err(e) => {
                    warn!(error = %e, "Reconnect attempt failed");
                    self.set_state(generation, TransportState::Error);
                    self.error_handlers.emit(|handler| handler(&e));
                    self.set_state(generation, TransportState::Disconnected);
                    self.close_handlers.emit(|handler| handler());
                }
            }
        }
    }

    /// Pumps one socket until it closes, fails or shutdown is requested.
    async fn run_connection(
        &self,
        generation: u64,
        ws: WsStream,
        mut outbound_rx: OutboundRx,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        let (mut ws_write, mut ws_read) = ws.split();

        if self.is_shut_down() {
            let _ = ws_write.close().await;
            return;
        }

        loop {
            tokio::select! {
                // Incoming frames from the peer
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),

                        Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                            Ok(text) => self.dispatch(text),
                            Err(e) => self.report(Error::protocol(format!(
                                "Binary frame is not UTF-8: {e}"
                            ))),
                        },

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            self.set_state(generation, TransportState::Error);
                            self.report(Error::WebSocket(e));
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ping, Pong and raw frames are handled by tungstenite
                        Some(Ok(_)) => {}
                    }
                }

                // Outgoing frames from send()
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if let Err(e) = ws_write.send(message).await {
                                warn!(error = %e, "Failed to write frame");
                                self.set_state(generation, TransportState::Error);
                                self.report(Error::WebSocket(e));
                                break;
                            }
                        }

                        None => {
                            debug!("Outbound queue closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }

                _ = shutdown.changed() => {
                    debug!("Shutdown requested");
                    let _ = ws_write.close().await;
                    break;
                }
            }
        }
    }

    /// Parses one inbound payload and fans it out.
    fn dispatch(&self, text: &str) {
        match Frame::parse(text) {
            Ok(frame) => {
                trace!(kind = frame.kind(), "Frame received");
                self.message_handlers.emit(|handler| handler(&frame));
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse inbound frame");
                self.report(e);
            }
        }
    }

    fn report(&self, error: Error) {
        self.error_handlers.emit(|handler| handler(&error));
    }
}

// ============================================================================
// Tests
// ============================================================================
