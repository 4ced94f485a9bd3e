//! Benchmarks for whole workloads driven through the harness
//!
//! Run with: cargo bench --bench workloads
//!
//! Uses the reduced scale so each iteration finishes in milliseconds. The
//! harness writes its report into a reused buffer.

#![allow(clippy::panic)]

use bounded_rand::source::{Pcg32, Pcg64, SeedableSource};
use bounded_rand::{Algorithm, Harness, Word, Workload, WorkloadScale};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

/// One representative per family keeps the run short.
const PICKS: [Algorithm; 6] = [
    Algorithm::BiasedMod,
    Algorithm::DebiasedDiv,
    Algorithm::DebiasedModX2ToptMopt,
    Algorithm::DebiasedModX1Mopt,
    Algorithm::DebiasedIntMultToptMoptBopt,
    Algorithm::BitmaskAlt,
];

fn samples<W: Word>(plan: &[Workload<W>]) -> u64 {
    plan.iter().map(Workload::len).sum()
}

fn bench_reduced_plan(c: &mut Criterion) {
    let scale = WorkloadScale::reduced();
    let narrow = Harness::<u32>::new(&scale).unwrap_or_else(|err| panic!("{err}"));
    let wide = Harness::<u64>::new(&scale).unwrap_or_else(|err| panic!("{err}"));

    let mut group = c.benchmark_group("Reduced plan");
    group.sample_size(20);
    let mut out = Vec::with_capacity(1024);

    group.throughput(Throughput::Elements(samples(narrow.workloads())));
    for algorithm in PICKS {
        group.bench_function(BenchmarkId::new("32-bit", algorithm.name()), |b| {
            b.iter(|| {
                out.clear();
                let mut source = Pcg32::seed_from_u64(7);
                narrow.run(black_box(algorithm), &mut source, &mut out)
            });
        });
    }

    group.throughput(Throughput::Elements(samples(wide.workloads())));
    for algorithm in PICKS {
        group.bench_function(BenchmarkId::new("64-bit", algorithm.name()), |b| {
            b.iter(|| {
                out.clear();
                let mut source = Pcg64::seed_from_u64(7);
                wide.run(black_box(algorithm), &mut source, &mut out)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reduced_plan);
criterion_main!(benches);
