//! Relay fan-out benchmarks
//!
//! Run with: cargo bench --bench fanout

use birdsong_core::models::TweetEvent;
use birdsong_relay::{BroadcastRelay, RelayLimits, ViewerSession};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn relay_with_sessions(count: usize, session_buffer: usize) -> (BroadcastRelay, Vec<ViewerSession>) {
    let relay = BroadcastRelay::new(RelayLimits {
        session_buffer,
        max_sessions: 0,
    });
    let sessions = (0..count).map(|_| relay.register().unwrap()).collect();
    (relay, sessions)
}

/// Benchmark: publish to viewers that keep up (frames delivered, then drained)
fn bench_publish_delivered(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_delivered");

    for viewers in [10, 100, 1000] {
        let (relay, mut sessions) = relay_with_sessions(viewers, 16);
        let event = TweetEvent::new("alice", "a bird flew by");

        group.bench_with_input(BenchmarkId::from_parameter(viewers), &viewers, |b, _| {
            b.iter(|| {
                let report = relay.publish(event.clone()).unwrap();
                for session in &mut sessions {
                    black_box(session.try_recv());
                }
                black_box(report);
            });
        });
    }

    group.finish();
}

/// Benchmark: publish when every viewer's buffer is already full
fn bench_publish_saturated(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_saturated");

    for viewers in [10, 100, 1000] {
        let (relay, _sessions) = relay_with_sessions(viewers, 1);
        let event = TweetEvent::new("alice", "a bird flew by");
        relay.publish(event.clone()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(viewers), &viewers, |b, _| {
            b.iter(|| black_box(relay.publish(event.clone()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_publish_delivered, bench_publish_saturated);
criterion_main!(benches);
