//! Determinism and end-to-end harness tests.

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use bounded_rand::source::{CountingSource, Pcg32, Pcg64, SeedableSource};
use bounded_rand::telemetry::CollectingObserver;
use bounded_rand::{
    assert_no_violations, run_benchmark, Algorithm, BenchConfig, Harness, SeedPolicy, Width,
    Workload, WorkloadScale,
};
use std::sync::Arc;

fn tiny() -> WorkloadScale {
    WorkloadScale {
        shrinking_top: 500,
        small_top: 20,
        small_repeats: 4,
        samples_per_bit: 8,
        constant_count: 64,
    }
}

fn report_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|line| !line.contains("completed ("))
        .map(str::to_owned)
        .collect()
}

#[test]
fn test_same_seed_same_outputs_every_algorithm() {
    for &algorithm in Algorithm::ALL {
        let mut a = Pcg64::seed_from_u64(77);
        let mut b = Pcg64::seed_from_u64(77);
        let first: Vec<u64> = (1..200u64).map(|range| algorithm.sample(&mut a, range * 997)).collect();
        let second: Vec<u64> = (1..200u64).map(|range| algorithm.sample(&mut b, range * 997)).collect();
        assert_eq!(first, second, "{algorithm}");
    }
}

#[test]
fn test_same_seed_same_report_both_widths() {
    for width in [Width::W32, Width::W64] {
        for &algorithm in Algorithm::ALL {
            let config = BenchConfig::smoke()
                .with_width(width)
                .with_scale(tiny())
                .with_algorithm(algorithm)
                .with_seed(SeedPolicy::Fixed(0xC0FFEE));
            let mut first = Vec::new();
            let mut second = Vec::new();
            let a = run_benchmark(&config, &mut first).unwrap();
            let b = run_benchmark(&config, &mut second).unwrap();

            assert_eq!(report_lines(&first), report_lines(&second), "{algorithm} {width}");
            assert_eq!(a.words_used, b.words_used);
            let checksums = |report: &bounded_rand::RunReport| -> Vec<u128> {
                report.workloads.iter().map(|w| w.checksum).collect()
            };
            assert_eq!(checksums(&a), checksums(&b));
        }
    }
}

#[test]
fn test_different_seeds_diverge() {
    let run = |seed| {
        let config = BenchConfig::smoke()
            .with_scale(tiny())
            .with_seed(SeedPolicy::Fixed(seed));
        run_benchmark(&config, &mut Vec::new()).unwrap()
    };
    assert_ne!(run(1).workloads[0].checksum, run(2).workloads[0].checksum);
}

#[test]
fn test_shrinking_sweep_with_division_method_terminates() {
    let collector = Arc::new(CollectingObserver::new());
    let harness = Harness::<u32>::from_workloads(vec![Workload::Shrinking {
        top: WorkloadScale::reduced().shrinking_top,
    }])
    .unwrap()
    .with_observer(collector.clone());

    let mut source = CountingSource::new(Pcg32::seed_from_u64(2024));
    let report = harness
        .run(Algorithm::DebiasedDiv, &mut source, &mut Vec::new())
        .unwrap();
    assert_eq!(report.samples(), 0xFFFF);
    // range 1 is the only one answered without a draw
    assert!(source.drawn() >= 0xFFFE);
    assert_no_violations!(collector);
}

#[test]
fn test_reduced_plan_runs_every_algorithm_at_both_widths() {
    let narrow = Harness::<u32>::new(&WorkloadScale::reduced()).unwrap();
    let wide = Harness::<u64>::new(&WorkloadScale::reduced()).unwrap();
    for &algorithm in Algorithm::ALL {
        let report = narrow
            .run_measured(algorithm, &mut Pcg32::seed_from_u64(5), &mut Vec::new())
            .unwrap();
        assert_eq!(report.workloads.len(), 3);
        if algorithm != Algorithm::DebiasedDiv {
            assert!(report.draws_per_sample().unwrap() >= 1.0, "{algorithm}");
        }

        let report = wide
            .run_measured(algorithm, &mut Pcg64::seed_from_u64(5), &mut Vec::new())
            .unwrap();
        assert_eq!(report.workloads.len(), 5);
    }
}

#[test]
fn test_report_round_trips_through_json() {
    let config = BenchConfig::smoke()
        .with_scale(tiny())
        .with_seed(SeedPolicy::Fixed(3));
    let report = run_benchmark(&config, &mut Vec::new()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["label"], "debiased-int-mult-topt");
    assert_eq!(json["seed"], 3);
    assert_eq!(
        json["workloads"][0]["checksum"],
        report.workloads[0].checksum.to_string()
    );
}
