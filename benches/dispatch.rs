//! Event dispatch benchmark suite.
//!
//! Measures the cost of moving transport events to the host:
//! - Batch sizes: 1, 64, 1024 events per drain
//! - Payloads: text, binary
//! - Handshake header parsing and CA bundle loading
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use parking_lot::Mutex;
use websocket_bridge::host::{EventDispatcher, HandleRegistry, SessionState};
use websocket_bridge::tls::{CaFormat, TrustAnchorSet};
use websocket_bridge::{ConnectionHandle, HostListener, PendingEvent, ResponseHeaders, host_queue};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[1, 64, 1024];
const PAYLOAD_BYTES: usize = 256;

const BUNDLE_PEM: &[u8] = include_bytes!("../tests/fixtures/bundle.pem");

const RESPONSE_HEADERS: &str = "Upgrade: websocket\n\
                                Connection: Upgrade\n\
                                Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\n\
                                Sec-WebSocket-Protocol: chat\n\
                                Sec-WebSocket-Extensions: permessage-deflate\n";

// ============================================================================
// Host Double
// ============================================================================

struct Counting(Mutex<usize>);

impl HostListener for Counting {
    fn on_open(&self, _: &str, _: &str, _: ConnectionHandle) {
        *self.0.lock() += 1;
    }
    fn on_string_message(&self, text: &str, _: ConnectionHandle) {
        *self.0.lock() += text.len();
    }
    fn on_binary_message(&self, bytes: &[u8], _: ConnectionHandle) {
        *self.0.lock() += bytes.len();
    }
    fn on_closed(&self, _: u16, _: &str, _: ConnectionHandle) {}
    fn on_error(&self, _: &str, _: ConnectionHandle) {}
}

fn handle() -> ConnectionHandle {
    ConnectionHandle::from_raw(1, 0xbe_ef).unwrap()
}

// ============================================================================
// Benchmark: Dispatch and Drain
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for &batch in BATCH_SIZES {
        group.throughput(Throughput::Elements(batch as u64));

        for kind in ["text", "binary"] {
            group.bench_with_input(BenchmarkId::new(kind, batch), &batch, |b, &batch| {
                let (queue, mut host_loop) = host_queue();
                let dispatcher = EventDispatcher::new(
                    Arc::new(HandleRegistry::new(handle())),
                    Arc::new(Counting(Mutex::new(0))),
                    Arc::new(queue),
                    Arc::new(Mutex::new(SessionState::default())),
                );

                b.iter(|| {
                    for _ in 0..batch {
                        let event = if kind == "text" {
                            PendingEvent::TextMessage("x".repeat(PAYLOAD_BYTES))
                        } else {
                            PendingEvent::BinaryMessage(vec![0u8; PAYLOAD_BYTES])
                        };
                        dispatcher.dispatch(event);
                    }
                    black_box(host_loop.run_pending())
                });
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Invalidated Handle
// ============================================================================

fn bench_dispatch_after_destroy(c: &mut Criterion) {
    let (queue, mut host_loop) = host_queue();
    let registry = Arc::new(HandleRegistry::new(handle()));
    let dispatcher = EventDispatcher::new(
        Arc::clone(&registry),
        Arc::new(Counting(Mutex::new(0))),
        Arc::new(queue),
        Arc::new(Mutex::new(SessionState::default())),
    );
    registry.invalidate();

    c.bench_function("dispatch_after_destroy", |b| {
        b.iter(|| {
            dispatcher.dispatch(PendingEvent::TextMessage(String::from("dropped")));
            black_box(host_loop.run_pending())
        });
    });
}

// ============================================================================
// Benchmark: Handshake and Trust
// ============================================================================

fn bench_parse_headers(c: &mut Criterion) {
    c.bench_function("response_headers_parse", |b| {
        b.iter(|| {
            let headers = ResponseHeaders::parse(black_box(RESPONSE_HEADERS));
            black_box(headers.extensions().map(str::len))
        });
    });
}

fn bench_load_bundle(c: &mut Criterion) {
    c.bench_function("ca_bundle_load", |b| {
        b.iter(|| TrustAnchorSet::load(black_box(BUNDLE_PEM), CaFormat::Pem).map(|set| set.len()));
    });
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_dispatch_after_destroy,
    bench_parse_headers,
    bench_load_bundle
);
criterion_main!(benches);
