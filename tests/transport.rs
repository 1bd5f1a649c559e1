//! Transport behaviour against a real WebSocket server.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use socket_bus::{Error, Frame, TransportConfig, TransportState, WebSocketTransport};

use common::{TestServer, eventually};
use tokio_test::{assert_err, assert_ok};

fn event_name(frame: &Frame) -> String {
    match frame {
        Frame::Event(event) => event.event.clone(),
        other => panic!("expected event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sends_arrive_in_call_order() {
    let mut server = TestServer::start().await;
    let transport = WebSocketTransport::new(server.config());

    assert_ok!(transport.connect().await);
    let mut peer = server.accept().await;
    assert_eq!(transport.state(), TransportState::Connected);

    for name in ["one", "two", "three"] {
        assert_ok!(transport.send(Frame::event(name, json!(null))).await);
    }

    assert_eq!(event_name(&peer.recv().await), "one");
    assert_eq!(event_name(&peer.recv().await), "two");
    assert_eq!(event_name(&peer.recv().await), "three");

    transport.close().await;
}

#[tokio::test]
async fn test_inbound_frames_and_parse_errors() {
    let mut server = TestServer::start().await;
    let transport = WebSocketTransport::new(server.config());

    let frames = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&frames);
    transport.on_message(move |frame: &Frame| sink.lock().push(frame.clone()));
    let counter = Arc::clone(&errors);
    transport.on_error(move |e: &Error| {
        if matches!(e, Error::Json(_)) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    transport.connect().await.expect("connect");
    let mut peer = server.accept().await;

    peer.send_text("not json at all").await;
    peer.send(&Frame::event("textDelta", json!("hi"))).await;

    assert!(eventually(|| frames.lock().len() == 1).await);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(event_name(&frames.lock()[0]), "textDelta");

    // The socket survives a malformed frame
    assert!(transport.is_connected());
    transport.close().await;
}

#[tokio::test]
async fn test_buffered_frames_flush_before_new_sends() {
    let mut server = TestServer::start().await;
    let config = TransportConfig::builder(server.url())
        .reconnect_interval(Duration::from_millis(300))
        .build()
        .expect("valid config");
    let transport = WebSocketTransport::new(config);

    transport.connect().await.expect("connect");
    server.accept().await.close().await;

    assert!(eventually(|| !transport.is_connected()).await);

    let a = transport.send(Frame::event("a", json!(null))).await;
    let b = transport.send(Frame::event("b", json!(null))).await;
    assert!(matches!(a, Err(Error::NotConnected)));
    assert!(matches!(b, Err(Error::NotConnected)));

    let mut peer = server.accept().await;
    assert!(eventually(|| transport.is_connected()).await);
    transport
        .send(Frame::event("c", json!(null)))
        .await
        .expect("send after reconnect");

    assert_eq!(event_name(&peer.recv().await), "a");
    assert_eq!(event_name(&peer.recv().await), "b");
    assert_eq!(event_name(&peer.recv().await), "c");
    assert_eq!(transport.buffered_len(), 0);

    transport.close().await;
}

#[tokio::test]
async fn test_backoff_grows_then_resets() {
    let mut server = TestServer::start().await;
    let transport = WebSocketTransport::new(server.config());
    let initial = transport.config().reconnect_interval();
    let max = transport.config().max_reconnect_interval();

    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    transport.on_error(move |e: &Error| {
        if matches!(e, Error::Connection { .. } | Error::ConnectionTimeout { .. }) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    transport.connect().await.expect("connect");
    let peer = server.accept().await;
    let addr = server.stop().await;
    peer.close().await;

    // 20 -> 40 -> 80 -> 160 -> 200 (capped)
    assert!(eventually(|| failures.load(Ordering::SeqCst) >= 5).await);
    assert_eq!(transport.next_reconnect_delay(), max);

    let mut server = TestServer::start_on(addr).await;
    let _peer = server.accept().await;

    assert!(eventually(|| transport.is_connected()).await);
    assert_eq!(transport.next_reconnect_delay(), initial);

    transport.close().await;
}

#[tokio::test]
async fn test_close_stops_reconnection() {
    let mut server = TestServer::start().await;
    let transport = WebSocketTransport::new(server.config());

    transport.connect().await.expect("connect");
    let mut peer = server.accept().await;

    transport.close().await;
    assert_eq!(transport.state(), TransportState::Closed);
    assert!(peer.wait_closed().await);

    // Longer than several backoff periods
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.state(), TransportState::Closed);

    let err = transport
        .send(Frame::event("late", json!(null)))
        .await
        .expect_err("closed");
    assert!(matches!(err, Error::TransportClosed));
    assert_eq!(transport.buffered_len(), 0);

    let err = assert_err!(transport.connect().await);
    assert!(matches!(err, Error::TransportClosed));
}

#[tokio::test]
async fn test_close_handlers_fire_on_remote_close() {
    let mut server = TestServer::start().await;
    let transport = WebSocketTransport::new(server.config());

    let closes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&closes);
    transport.on_close(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    transport.connect().await.expect("connect");
    server.accept().await.close().await;

    assert!(eventually(|| closes.load(Ordering::SeqCst) >= 1).await);

    // Comes back on its own
    let _peer = server.accept().await;
    assert!(eventually(|| transport.is_connected()).await);

    transport.close().await;
}

#[tokio::test]
async fn test_connect_is_noop_while_connected() {
    let mut server = TestServer::start().await;
    let transport = WebSocketTransport::new(server.config());

    transport.connect().await.expect("connect");
    let mut peer = server.accept().await;

    transport.connect().await.expect("second connect");
    transport
        .send(Frame::event("still-here", json!(null)))
        .await
        .expect("send");

    assert_eq!(event_name(&peer.recv().await), "still-here");
    transport.close().await;
}
