use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use snowpool::{Allocator, Layout, SystemClock, TimeSource, Worker};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::{Duration, Instant},
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

/// Benchmarks the hot path where the sequence never runs out.
fn bench_worker_hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker/fixed_clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let layout = Layout::new(Duration::ZERO, 10, 12).unwrap();
                let mut worker = Worker::new(0, layout, FixedMockTime { millis: 1 }).unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(worker.next_id().unwrap());
                }
            }
            start.elapsed()
        });
    });
    group.finish();
}

/// Benchmarks a single worker against the wall clock, including the waits
/// after each exhausted millisecond.
fn bench_worker_system_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker/system_clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let mut worker = Worker::new(0, Layout::default(), SystemClock).unwrap();
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(worker.next_id().unwrap());
            }
        });
    });
    group.finish();
}

/// Benchmarks `allocate` with several threads contending for a pool.
fn bench_allocator_contended(c: &mut Criterion) {
    const BATCH: usize = 500;

    for (threads, workers) in [(1, 1), (4, 1), (4, 4), (8, 4)] {
        let mut group = c.benchmark_group(format!("allocator/threads/{threads}/workers/{workers}"));
        group.throughput(Throughput::Elements((threads * BATCH) as u64));

        let allocator = Allocator::with_range(0, workers, Layout::default(), SystemClock).unwrap();
        group.bench_function(format!("batch/{BATCH}"), |b| {
            b.iter_custom(|iters| {
                let barrier = Arc::new(Barrier::new(threads + 1));
                scope(|s| {
                    for _ in 0..threads {
                        let barrier = Arc::clone(&barrier);
                        let allocator = &allocator;
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..iters {
                                black_box(allocator.allocate(BATCH).unwrap());
                            }
                        });
                    }
                    barrier.wait();
                    let start = Instant::now();
                    // Threads are joined when the scope ends.
                    start
                })
                .elapsed()
            });
        });
        group.finish();
    }
}

criterion_group!(
    benches,
    bench_worker_hot_path,
    bench_worker_system_clock,
    bench_allocator_contended
);
criterion_main!(benches);
