//! Statistical tests of the strategy catalog.
//!
//! Debiased strategies must pass a chi-square goodness-of-fit test; the
//! biased baselines must fail one at a range chosen to expose their bias.
//! Every test uses a fixed seed, so results are reproducible.

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

#[path = "common/mod.rs"]
mod common;

use bounded_rand::source::{BitSource, Pcg32, Pcg64, SeedableSource};
use bounded_rand::{Algorithm, Word};
use common::{biased, chi_square, critical_value, debiased, tally};

const SMALL_RANGES: [u32; 4] = [3, 5, 7, 251];
const SMALL_RANGE_DRAWS: usize = 50_000;
const BIAS_DRAWS: usize = 30_000;

fn small_range_statistic<S>(algorithm: Algorithm, range: u32) -> f64
where
    S: BitSource + SeedableSource,
{
    let cells = range as usize;
    let counts = tally::<S, _>(
        algorithm,
        u64::from(range),
        S::Word::from_u32(range),
        SMALL_RANGE_DRAWS,
        cells,
        |value| value.as_u64() as usize,
    );
    chi_square(&counts, &vec![1.0 / cells as f64; cells])
}

fn assert_small_ranges_uniform<S>()
where
    S: BitSource + SeedableSource,
{
    for algorithm in debiased() {
        for range in SMALL_RANGES {
            let statistic = small_range_statistic::<S>(algorithm, range);
            let limit = critical_value(range as usize - 1);
            assert!(
                statistic < limit,
                "{algorithm} at {}-bit, range {range}: chi-square {statistic:.1} >= {limit:.1}",
                S::Word::BITS
            );
        }
    }
}

#[test]
fn test_debiased_uniform_at_small_ranges_32() {
    assert_small_ranges_uniform::<Pcg32>();
}

#[test]
fn test_debiased_uniform_at_small_ranges_64() {
    assert_small_ranges_uniform::<Pcg64>();
}

/// `3 * 2^(W-2)`: does not divide `2^W`, and a third of its values have
/// twice the preimages under either plain reduction.
///
/// Cells split the output by `value < 2^(W-2)` (where modulo doubles up) and
/// by `value % 3` (where the high-half product doubles up).
fn bias_statistic<S>(algorithm: Algorithm) -> f64
where
    S: BitSource + SeedableSource,
{
    let third = S::Word::ONE << (S::Word::BITS - 2);
    let range = third + third + third;
    let counts = tally::<S, _>(algorithm, 0xB1A5, range, BIAS_DRAWS, 6, |value| {
        let block = if value < third { 0 } else { 3 };
        block + (value.as_u64() % 3) as usize
    });
    let low = 1.0 / 9.0;
    let high = 2.0 / 9.0;
    chi_square(&counts, &[low, low, low, high, high, high])
}

fn assert_bias_is_visible<S>()
where
    S: BitSource + SeedableSource,
{
    let limit = critical_value(5);
    for algorithm in debiased() {
        let statistic = bias_statistic::<S>(algorithm);
        assert!(
            statistic < limit,
            "{algorithm} at {}-bit looks biased: {statistic:.1} >= {limit:.1}",
            S::Word::BITS
        );
    }
    for algorithm in biased() {
        let statistic = bias_statistic::<S>(algorithm);
        assert!(
            statistic > limit,
            "{algorithm} at {}-bit looks uniform: {statistic:.1} <= {limit:.1}",
            S::Word::BITS
        );
    }
}

#[test]
fn test_only_biased_baselines_fail_at_three_quarters_32() {
    assert_bias_is_visible::<Pcg32>();
}

#[test]
fn test_only_biased_baselines_fail_at_three_quarters_64() {
    assert_bias_is_visible::<Pcg64>();
}

#[test]
fn test_debiased_mod_x2_range_seven_buckets() {
    let counts = tally::<Pcg32, _>(Algorithm::DebiasedModX2, 1, 7u32, 10_000, 7, |value| {
        value as usize
    });
    assert_eq!(counts.iter().sum::<u64>(), 10_000);
    let expected = 10_000.0 / 7.0;
    for (value, &count) in counts.iter().enumerate() {
        let deviation = (count as f64 - expected).abs() / expected;
        assert!(deviation <= 0.05, "value {value}: {count} draws");
    }
}
