//! Local WebSocket server for integration tests.
//!
//! Binds `127.0.0.1:0`, upgrades every accepted socket and hands it to the
//! test as a [`Peer`].

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use socket_bus::{Frame, TransportConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// TestServer
// ============================================================================

pub struct TestServer {
    addr: SocketAddr,
    peers: mpsc::UnboundedReceiver<Peer>,
    accept_loop: JoinHandle<()>,
}

impl TestServer {
    /// Binds a fresh server on a random port.
    pub async fn start() -> Self {
        init_logging();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        Self::serve(listener)
    }

    /// Binds a server on a specific port, e.g. to come back after [`stop`](Self::stop).
    pub async fn start_on(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.expect("rebind");
        Self::serve(listener)
    }

    fn serve(listener: TcpListener) -> Self {
        let addr = listener.local_addr().expect("local addr");
        let (tx, peers) = mpsc::unbounded_channel();

        let accept_loop = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                // A failed handshake only loses that one socket
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await
                    && tx.send(Peer { ws }).is_err()
                {
                    return;
                }
            }
        });

        Self {
            addr,
            peers,
            accept_loop,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Transport config with short reconnect delays.
    pub fn config(&self) -> TransportConfig {
        TransportConfig::builder(self.url())
            .reconnect_interval(Duration::from_millis(20))
            .max_reconnect_interval(Duration::from_millis(200))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .expect("valid config")
    }

    /// Waits for the next client socket.
    pub async fn accept(&mut self) -> Peer {
        timeout(WAIT, self.peers.recv())
            .await
            .expect("timed out waiting for client")
            .expect("accept loop stopped")
    }

    /// Stops listening. Already accepted peers stay open.
    pub async fn stop(self) -> SocketAddr {
        self.accept_loop.abort();
        let _ = self.accept_loop.await;
        self.addr
    }
}

// ============================================================================
// Peer
// ============================================================================

/// Server side of one accepted socket.
pub struct Peer {
    ws: WebSocketStream<TcpStream>,
}

impl Peer {
    /// Receives the next frame, skipping control messages.
    pub async fn recv(&mut self) -> Frame {
        let text = self.recv_text().await;
        Frame::parse(&text).expect("client sent a valid frame")
    }

    pub async fn recv_text(&mut self) -> String {
        loop {
            let message = timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("socket ended")
                .expect("socket error");

            match message {
                Message::Text(text) => return text.as_str().to_string(),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes.to_vec()).expect("utf-8 payload");
                }
                Message::Close(_) => panic!("client closed the socket"),
                _ => {}
            }
        }
    }

    pub async fn send(&mut self, frame: &Frame) {
        let text = frame.to_json().expect("serializable frame");
        self.send_text(&text).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .expect("server send");
    }

    /// Performs the close handshake from the server side.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        // Drain until the client acknowledges
        while let Ok(Some(Ok(_))) = timeout(WAIT, self.ws.next()).await {}
    }

    /// Returns `true` once the client has closed this socket.
    pub async fn wait_closed(&mut self) -> bool {
        loop {
            match timeout(WAIT, self.ws.next()).await {
                Ok(None | Some(Err(_)) | Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => {}
                Err(_) => return false,
            }
        }
    }
}

/// Installs a test-writer subscriber, filtered by `RUST_LOG` (default `socket_bus=debug`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("socket_bus=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Polls `condition` until it holds or [`WAIT`] elapses.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
