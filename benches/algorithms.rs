//! Benchmarks for individual bounded-rand strategies
//!
//! Run with: cargo bench --bench algorithms
//!
//! Each strategy draws a batch of values at a fixed range. Small ranges
//! almost never reject; ranges just above `2^(W-1)` reject close to half
//! the time, which is where the threshold and BOPT variants differ most.

use bounded_rand::source::{Pcg32, Pcg64, SeedableSource};
use bounded_rand::Algorithm;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const BATCH: u64 = 4096;

fn bench_narrow(c: &mut Criterion) {
    let mut group = c.benchmark_group("32-bit strategies");
    group.throughput(Throughput::Elements(BATCH));

    for (label, range) in [("range 7", 7u32), ("range 2^31+1", (1 << 31) + 1)] {
        for &algorithm in Algorithm::ALL {
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), label),
                &range,
                |b, &range| {
                    let mut source = Pcg32::seed_from_u64(42);
                    b.iter(|| {
                        let mut sum = 0u64;
                        for _ in 0..BATCH {
                            sum += u64::from(algorithm.sample(&mut source, black_box(range)));
                        }
                        sum
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("64-bit strategies");
    group.throughput(Throughput::Elements(BATCH));

    for (label, range) in [("range 52", 52u64), ("range 2^64-52", 52u64.wrapping_neg())] {
        for &algorithm in Algorithm::ALL {
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), label),
                &range,
                |b, &range| {
                    let mut source = Pcg64::seed_from_u64(42);
                    b.iter(|| {
                        let mut sum = 0u128;
                        for _ in 0..BATCH {
                            sum += u128::from(algorithm.sample(&mut source, black_box(range)));
                        }
                        sum
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_narrow, bench_wide);
criterion_main!(benches);
