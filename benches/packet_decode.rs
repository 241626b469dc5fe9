//! Packet decoding and echo round-trip benchmarks.
//!
//! - Decoding: text vs JSON frames at several payload sizes
//! - Round trip: send a frame to a local echo server and await its dispatch
//!
//! Run with: cargo bench --bench packet_decode
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use tokio::sync::{Mutex, mpsc};
use tradeagent_ws::transport::{ServerOptions, TestServer};
use tradeagent_ws::{ConnectionCallbacks, Packet, Result, WebsocketClient};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const FIELD_COUNTS: &[usize] = &[1, 16, 128];

// ============================================================================
// Benchmark: Decode
// ============================================================================

fn json_frame(fields: usize) -> String {
    let body: Vec<String> = (0..fields)
        .map(|i| format!(r#""field{i}":{{"p":"{i}.25","q":"{i}"}}"#))
        .collect();
    format!("{{{}}}", body.join(","))
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &fields in FIELD_COUNTS {
        let json = json_frame(fields);
        let text = "x".repeat(json.len());

        group.bench_with_input(BenchmarkId::new("json", fields), &json, |b, frame| {
            b.iter(|| Packet::decode(black_box(frame)));
        });
        group.bench_with_input(BenchmarkId::new("text", fields), &text, |b, frame| {
            b.iter(|| Packet::decode(black_box(frame)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Echo Round Trip
// ============================================================================

/// Forwards packets to the benchmark loop.
struct Forwarder(mpsc::UnboundedSender<Packet>);

impl ConnectionCallbacks for Forwarder {
    fn on_connected(&self) {}

    fn on_disconnected(&self) {}

    fn on_packet(&self, packet: Packet) -> Result<()> {
        let _ = self.0.send(packet);
        Ok(())
    }
}

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let (server, client, packets) = rt.block_on(async {
        let server = TestServer::bind(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            ServerOptions::new().with_echo(),
        )
        .await
        .unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let client = WebsocketClient::builder()
            .callbacks(Arc::new(Forwarder(tx)))
            .build()
            .unwrap();
        client.connect(&server.ws_url()).await.unwrap();

        (server, client, Arc::new(Mutex::new(rx)))
    });

    let mut group = c.benchmark_group("round_trip");

    for &fields in FIELD_COUNTS {
        let frame = json_frame(fields);
        group.bench_with_input(BenchmarkId::new("echo", fields), &frame, |b, frame| {
            b.to_async(&rt).iter(|| async {
                client.send_text(frame).await.unwrap();
                packets.lock().await.recv().await.unwrap()
            });
        });
    }

    group.finish();

    rt.block_on(client.stop());
    drop(server);
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_decode, bench_round_trip);
criterion_main!(benches);
