//! Property tests over the whole strategy catalog, at both word widths.

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use bounded_rand::source::{BitSource, CountingSource, Pcg32, Pcg64, ReplaySource, SeedableSource};
use bounded_rand::{Algorithm, Family, Word};
use proptest::prelude::*;

/// Draws per generated case.
const DRAWS: usize = 16;

macro_rules! catalog_properties {
    ($($variant:ident),+ $(,)?) => {
        const COVERED: &[Algorithm] = &[$(Algorithm::$variant),+];

        pastey::paste! {
            proptest! {
                #![proptest_config(ProptestConfig::with_cases(64))]
                $(
                    /// Property: every value lies in `[0, range)` for any non-zero 32-bit range.
                    #[test]
                    fn [<prop_ $variant:snake _below_range_32>](seed in any::<u64>(), range in 1u32..) {
                        let mut source = Pcg32::seed_from_u64(seed);
                        for _ in 0..DRAWS {
                            prop_assert!(Algorithm::$variant.sample(&mut source, range) < range);
                        }
                    }

                    /// Property: every value lies in `[0, range)` for any non-zero 64-bit range.
                    #[test]
                    fn [<prop_ $variant:snake _below_range_64>](seed in any::<u64>(), range in 1u64..) {
                        let mut source = Pcg64::seed_from_u64(seed);
                        for _ in 0..DRAWS {
                            prop_assert!(Algorithm::$variant.sample(&mut source, range) < range);
                        }
                    }

                    /// Property: the boundary ranges `MAX` and `2^(W-1) + 1` stay in bounds.
                    #[test]
                    fn [<prop_ $variant:snake _boundary_ranges>](seed in any::<u64>()) {
                        let mut narrow = Pcg32::seed_from_u64(seed);
                        let mut wide = Pcg64::seed_from_u64(seed);
                        for range in [u32::MAX, (1 << 31) + 1] {
                            prop_assert!(Algorithm::$variant.sample(&mut narrow, range) < range);
                        }
                        for range in [u64::MAX, (1 << 63) + 1] {
                            prop_assert!(Algorithm::$variant.sample(&mut wide, range) < range);
                        }
                    }
                )+
            }
        }
    };
}

catalog_properties! {
    Reference,
    BiasedFpMultLdexp,
    BiasedFpMultScale,
    BiasedMod,
    DebiasedDiv,
    DebiasedModX2,
    DebiasedModX2Mopt,
    DebiasedModX2Topt,
    DebiasedModX2ToptBopt,
    DebiasedModX2ToptMopt,
    DebiasedModX2ToptMoptX2,
    DebiasedModX1,
    DebiasedModX1Bopt,
    DebiasedModX1Mopt,
    BiasedIntMult,
    DebiasedIntMult,
    DebiasedIntMultTopt,
    DebiasedIntMultToptBopt,
    DebiasedIntMultToptMopt,
    DebiasedIntMultToptMoptBopt,
    Bitmask,
    BitmaskAlt,
}

#[test]
fn test_properties_cover_the_catalog() {
    assert_eq!(COVERED, Algorithm::ALL);
}

/// Runs `algorithm` and a direct reduction of the same word, checking that
/// exactly one word was consumed.
fn single_draw<W: Word>(algorithm: Algorithm, word: W, range: W) -> W {
    let mut source = CountingSource::new(ReplaySource::new(vec![word]));
    let value = algorithm.sample(&mut source, range);
    assert_eq!(source.drawn(), 1, "{algorithm}");
    value
}

fn same_stream<S: BitSource + Clone>(
    a: Algorithm,
    b: Algorithm,
    source: &S,
    range: S::Word,
) -> (Vec<S::Word>, Vec<S::Word>) {
    let mut left = source.clone();
    let mut right = source.clone();
    let left = (0..DRAWS).map(|_| a.sample(&mut left, range)).collect();
    let right = (0..DRAWS).map(|_| b.sample(&mut right, range)).collect();
    (left, right)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: the single-draw baselines are their reduction of one word.
    #[test]
    fn prop_single_draw_baselines_32(word in any::<u32>(), range in 1u32..) {
        prop_assert_eq!(single_draw(Algorithm::BiasedMod, word, range), word % range);
        prop_assert_eq!(
            single_draw(Algorithm::BiasedIntMult, word, range),
            Word::widening_mul(word, range).0
        );
        prop_assert_eq!(
            single_draw(Algorithm::BiasedFpMultLdexp, word, range),
            single_draw(Algorithm::BiasedFpMultScale, word, range)
        );
    }

    /// Property: same as above at 64 bits.
    #[test]
    fn prop_single_draw_baselines_64(word in any::<u64>(), range in 1u64..) {
        prop_assert_eq!(single_draw(Algorithm::BiasedMod, word, range), word % range);
        prop_assert_eq!(
            single_draw(Algorithm::BiasedIntMult, word, range),
            Word::widening_mul(word, range).0
        );
        prop_assert_eq!(
            single_draw(Algorithm::BiasedFpMultLdexp, word, range),
            single_draw(Algorithm::BiasedFpMultScale, word, range)
        );
    }

    /// Property: below `2^(W-1)`, a power-of-two range has a zero threshold,
    /// so the modulo strategies match `BiasedMod` and the multiplication
    /// strategies match `BiasedIntMult` word for word.
    ///
    /// BOPT variants reject words at or above `2^(W-1)`, so that range is left out.
    #[test]
    fn prop_power_of_two_ranges_never_reject(seed in any::<u64>(), bit in 0u32..31, wide_bit in 0u32..63) {
        let narrow = Pcg32::seed_from_u64(seed);
        let wide = Pcg64::seed_from_u64(seed);
        for &algorithm in Algorithm::ALL {
            let baseline = match algorithm.family() {
                Family::DebiasedModuloX2 | Family::DebiasedModuloX1 => Algorithm::BiasedMod,
                Family::DebiasedMultiply => Algorithm::BiasedIntMult,
                _ => continue,
            };
            let (got, want) = same_stream(algorithm, baseline, &narrow, 1u32 << bit);
            prop_assert_eq!(got, want, "{} at 2^{}", algorithm, bit);
            let (got, want) = same_stream(algorithm, baseline, &wide, 1u64 << wide_bit);
            prop_assert_eq!(got, want, "{} at 2^{}", algorithm, wide_bit);
        }
    }
}
