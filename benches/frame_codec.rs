//! Frame codec and request correlation benchmarks.
//!
//! Measures JSON encode/decode for each frame kind at a few payload sizes,
//! and a full request round trip through the bus over an in-memory
//! loopback transport.
//!
//! Run with: cargo bench --bench frame_codec
//! Results saved to: target/criterion/

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use parking_lot::Mutex;
use serde_json::{Value, json};
use socket_bus::transport::MessageHandler;
use socket_bus::{Frame, MessageBus, RequestId, Result, SubscriptionId, Transport};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PAYLOAD_ITEMS: &[usize] = &[1, 32, 512];

fn payload(items: usize) -> Value {
    let entries: Vec<Value> = (0..items)
        .map(|i| json!({"index": i, "name": format!("item-{i}"), "enabled": i % 2 == 0}))
        .collect();
    json!({ "items": entries })
}

fn sample_frames(items: usize) -> Vec<(&'static str, Frame)> {
    let id = RequestId::generate();
    vec![
        ("request", Frame::request(id.clone(), "session.update", payload(items))),
        ("response", Frame::success(id, payload(items))),
        ("event", Frame::event("textDelta", payload(items))),
    ]
}

// ============================================================================
// Benchmark: Encode / Decode
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for &items in PAYLOAD_ITEMS {
        for (kind, frame) in sample_frames(items) {
            let size = frame.to_json().map_or(0, |text| text.len());
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(kind, items), &frame, |b, frame| {
                b.iter(|| frame.to_json());
            });
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &items in PAYLOAD_ITEMS {
        for (kind, frame) in sample_frames(items) {
            let Ok(text) = frame.to_json() else {
                continue;
            };
            group.throughput(Throughput::Bytes(text.len() as u64));
            group.bench_with_input(BenchmarkId::new(kind, items), &text, |b, text| {
                b.iter(|| Frame::parse(text));
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Request Round Trip
// ============================================================================

/// Answers every request immediately with its own params.
#[derive(Default)]
struct Loopback {
    handlers: Mutex<Vec<(SubscriptionId, MessageHandler)>>,
}

#[async_trait]
impl Transport for Loopback {
    async fn send(&self, frame: Frame) -> Result<()> {
        if let Frame::Request(request) = frame {
            let reply = Frame::success(request.id, request.params);
            let handlers: Vec<_> = self.handlers.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
            for handler in handlers {
                handler(&reply);
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn on_message(&self, handler: MessageHandler) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.handlers.lock().push((id, handler));
        id
    }

    fn remove_handler(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(entry, _)| *entry != id);
        handlers.len() != before
    }
}

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let bus = MessageBus::new();
    bus.set_transport(Loopback::default());

    let mut group = c.benchmark_group("round_trip");

    for &items in PAYLOAD_ITEMS {
        let params = payload(items);
        group.bench_with_input(BenchmarkId::new("request", items), &params, |b, params| {
            b.to_async(&rt)
                .iter(|| async { bus.request("echo", params.clone()).await });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_round_trip);
criterion_main!(benches);
