//! Common test infrastructure shared across integration tests.
//!
//! This module provides:
//! - `chi_square` / `critical_value`: Pearson's goodness-of-fit statistic and
//!   a conservative rejection threshold for it
//! - `tally`: draws from one algorithm and bins the results
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! #[path = "common/mod.rs"]
//! mod common;
//! use common::{chi_square, critical_value, tally};
//! ```

#![allow(dead_code)] // each test binary uses a subset

use bounded_rand::source::{BitSource, SeedableSource};
use bounded_rand::Algorithm;

/// Standard normal quantile for a one-sided tail of about `1e-6`.
const Z_ONE_IN_A_MILLION: f64 = 4.753;

/// Pearson's statistic for `observed` counts against `expected` proportions.
///
/// `expected` must sum to one and have the same length as `observed`.
pub fn chi_square(observed: &[u64], expected: &[f64]) -> f64 {
    assert_eq!(observed.len(), expected.len());
    let total: u64 = observed.iter().sum();
    observed
        .iter()
        .zip(expected)
        .map(|(&seen, &proportion)| {
            let want = proportion * total as f64;
            let diff = seen as f64 - want;
            diff * diff / want
        })
        .sum()
}

/// Wilson–Hilferty approximation of the chi-square quantile with
/// `degrees` degrees of freedom at `p ≈ 1e-6`.
pub fn critical_value(degrees: usize) -> f64 {
    let k = degrees as f64;
    let spread = (2.0 / (9.0 * k)).sqrt();
    k * (1.0 - 2.0 / (9.0 * k) + Z_ONE_IN_A_MILLION * spread).powi(3)
}

/// Draws `draws` values in `[0, range)` from a source seeded with `seed` and
/// counts them into `cells` bins chosen by `cell`.
///
/// Panics if any value is out of range.
pub fn tally<S, F>(
    algorithm: Algorithm,
    seed: u64,
    range: S::Word,
    draws: usize,
    cells: usize,
    cell: F,
) -> Vec<u64>
where
    S: BitSource + SeedableSource,
    F: Fn(S::Word) -> usize,
{
    let mut source = S::seed_from_u64(seed);
    let mut counts = vec![0u64; cells];
    for _ in 0..draws {
        let value = algorithm.sample(&mut source, range);
        assert!(value < range, "{algorithm}: {value} >= {range}");
        counts[cell(value)] += 1;
    }
    counts
}

/// Every strategy whose output is meant to be uniform.
pub fn debiased() -> impl Iterator<Item = Algorithm> {
    Algorithm::ALL.iter().copied().filter(|a| !a.is_biased())
}

/// The knowingly biased baselines.
pub fn biased() -> impl Iterator<Item = Algorithm> {
    Algorithm::ALL.iter().copied().filter(|a| a.is_biased())
}
