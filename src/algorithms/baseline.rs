//! Reference and baseline strategies.
//!
//! [`reference`] is the ready-made answer. The floating-point and plain-modulo
//! strategies are fast but biased, and [`debiased_div`] is the classic
//! textbook fix that pays a division per draw.

use crate::source::{BitSource, RandCoreAdapter};
use crate::word::Word;
use rand::distributions::{Distribution, Uniform};

/// Samples `rand`'s `Uniform` distribution over `[0, range)`.
///
/// The distribution is built per call, so its own setup cost is included in
/// the measurement.
#[inline]
pub fn reference<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let distribution: Uniform<S::Word> = Uniform::new(S::Word::ZERO, range);
    distribution.sample(&mut RandCoreAdapter::new(source))
}

/// Scales `range` by `ldexp(word, -W)`. Biased.
#[inline]
pub fn biased_fp_mult_ldexp<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    source.next_word().scale_ldexp(range)
}

/// Scales `range` by `word * 2^-W`. Biased.
#[inline]
pub fn biased_fp_mult_scale<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    source.next_word().scale_constant(range)
}

/// `word % range`. Biased toward small values unless `range` divides `2^W`.
#[inline]
pub fn biased_mod<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    source.next_word() % range
}

/// Divides by the bucket size and rejects the partial top bucket.
///
/// The bucket size `floor((2^W - range) / range) + 1` equals
/// `floor(2^W / range)` and wraps to zero only for `range == 1`, which
/// returns `0` without drawing.
#[inline]
pub fn debiased_div<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let divisor = (range.wrapping_neg() / range).wrapping_add(S::Word::ONE);
    if divisor == S::Word::ZERO {
        return S::Word::ZERO;
    }
    loop {
        let value = source.next_word() / divisor;
        if value < range {
            return value;
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::source::{CountingSource, Pcg32, Pcg64, ReplaySource, SeedableSource};

    #[test]
    fn test_biased_mod_is_plain_remainder() {
        let mut source = ReplaySource::new(vec![10u32, u32::MAX, 6]);
        assert_eq!(biased_mod(&mut source, 7), 3);
        assert_eq!(biased_mod(&mut source, 7), 3);
        assert_eq!(biased_mod(&mut source, 7), 6);
    }

    #[test]
    fn test_fp_scaling_maps_fraction_of_range() {
        let mut source = ReplaySource::new(vec![0u32, 1 << 31, u32::MAX]);
        assert_eq!(biased_fp_mult_scale(&mut source, 10), 0);
        assert_eq!(biased_fp_mult_scale(&mut source, 10), 5);
        assert_eq!(biased_fp_mult_scale(&mut source, 10), 9);

        let mut source = ReplaySource::new(vec![1u64 << 62]);
        assert_eq!(biased_fp_mult_ldexp(&mut source, 1000), 250);
    }

    #[test]
    fn test_debiased_div_rejects_top_bucket() {
        // floor(2^32 / 7) = 613566756; 7 buckets cover [0, 4294967292).
        let divisor = 613_566_756u32;
        let mut source = CountingSource::new(ReplaySource::new(vec![u32::MAX, divisor * 3]));
        assert_eq!(debiased_div(&mut source, 7), 3);
        assert_eq!(source.drawn(), 2);
    }

    #[test]
    fn test_debiased_div_range_one_draws_nothing() {
        let mut source = CountingSource::new(Pcg64::seed_from_u64(1));
        assert_eq!(debiased_div(&mut source, 1u64), 0);
        assert_eq!(source.drawn(), 0);
    }

    #[test]
    fn test_debiased_div_power_of_two_never_rejects() {
        let mut source = CountingSource::new(Pcg32::seed_from_u64(2));
        for _ in 0..100 {
            assert!(debiased_div(&mut source, 1u32 << 20) < 1 << 20);
        }
        assert_eq!(source.drawn(), 100);
    }

    #[test]
    fn test_reference_stays_in_range() {
        let mut narrow = Pcg32::seed_from_u64(3);
        let mut wide = Pcg64::seed_from_u64(3);
        for range in [1u32, 2, 3, 7, 1000, u32::MAX] {
            for _ in 0..50 {
                assert!(reference(&mut narrow, range) < range);
                assert!(reference(&mut wide, u64::from(range)) < u64::from(range));
            }
        }
        assert!(reference(&mut wide, u64::MAX) < u64::MAX);
    }

    #[test]
    fn test_reference_draws_one_word_for_easy_ranges() {
        let mut source = CountingSource::new(Pcg64::seed_from_u64(4));
        for _ in 0..100 {
            let _ = reference(&mut source, 1u64 << 40);
        }
        assert_eq!(source.drawn(), 100);
    }
}
