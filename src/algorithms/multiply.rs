//! Integer-multiplication strategies.
//!
//! `word * range` is a `2W`-bit product whose high half lies in `[0, range)`.
//! Taken alone that is [`biased_int_mult`]. Lemire's method rejects the
//! products whose low half falls below `2^W mod range`, which removes exactly
//! the surplus words and leaves every output with the same preimage count.
//!
//! Reference: Daniel Lemire, "Fast Random Integer Generation in an Interval",
//! ACM TOMACS 29(1), 2019.

use super::modulo::{threshold_mopt, threshold_rem};
use crate::source::BitSource;
use crate::word::Word;

/// Redraws while the low half of the product is below `threshold(range)`.
///
/// The threshold is only computed when the first low half is below `range`.
#[inline(always)]
fn lemire_topt<S: BitSource>(
    source: &mut S,
    first: S::Word,
    range: S::Word,
    threshold: fn(S::Word) -> S::Word,
) -> S::Word {
    let (mut high, mut low) = first.widening_mul(range);
    if low < range {
        let threshold = threshold(range);
        while low < threshold {
            (high, low) = source.next_word().widening_mul(range);
        }
    }
    high
}

/// Rejects with plain comparison when `range >= 2^(W-1)`.
///
/// Returns `None` for smaller ranges so the caller continues with `first`.
#[inline(always)]
fn large_range_rejection<S: BitSource>(
    source: &mut S,
    first: S::Word,
    range: S::Word,
) -> Option<S::Word> {
    if range < S::Word::HALF {
        return None;
    }
    let mut word = first;
    while word >= range {
        word = source.next_word();
    }
    Some(word)
}

/// High half of `word * range`. Biased unless `range` divides `2^W`.
#[inline]
pub fn biased_int_mult<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    source.next_word().widening_mul(range).0
}

/// Lemire's method with the threshold computed up front.
#[inline]
pub fn debiased_int_mult<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let threshold = threshold_rem(range);
    loop {
        let (high, low) = source.next_word().widening_mul(range);
        if low >= threshold {
            return high;
        }
    }
}

/// Lemire's method, computing the threshold only when it can matter.
#[inline]
pub fn debiased_int_mult_topt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    lemire_topt(source, first, range, threshold_rem)
}

/// [`debiased_int_mult_topt`], with plain rejection for `range >= 2^(W-1)`.
#[inline]
pub fn debiased_int_mult_topt_bopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    if let Some(word) = large_range_rejection(source, first, range) {
        return word;
    }
    lemire_topt(source, first, range, threshold_rem)
}

/// [`debiased_int_mult_topt`] with the conditional-subtraction threshold.
#[inline]
pub fn debiased_int_mult_topt_mopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    lemire_topt(source, first, range, threshold_mopt)
}

/// TOPT, MOPT and BOPT together.
///
/// Past the BOPT gate `range < 2^(W-1)`, so `2^W - range > range` and the
/// first subtraction of the threshold is unconditional.
#[inline]
pub fn debiased_int_mult_topt_mopt_bopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    if let Some(word) = large_range_rejection(source, first, range) {
        return word;
    }
    lemire_topt(source, first, range, |range| {
        let threshold = range.wrapping_neg() - range;
        if threshold >= range {
            threshold % range
        } else {
            threshold
        }
    })
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
    use crate::source::{CountingSource, ReplaySource};
    use crate::test_config::miri_case_count;
    use proptest::prelude::*;

    type Strategy32 = fn(&mut CountingSource<ReplaySource<u32>>, u32) -> u32;

    fn replay(words: &[u32]) -> CountingSource<ReplaySource<u32>> {
        CountingSource::new(ReplaySource::new(words.to_vec()))
    }

    const DEBIASED: [(&str, Strategy32); 5] = [
        ("plain", debiased_int_mult),
        ("topt", debiased_int_mult_topt),
        ("topt-bopt", debiased_int_mult_topt_bopt),
        ("topt-mopt", debiased_int_mult_topt_mopt),
        ("topt-mopt-bopt", debiased_int_mult_topt_mopt_bopt),
    ];

    // 7 * 0xB6DB6DB7 = 5 * 2^32 + 1, so this word makes the low half 4.
    const LOW_HALF_FOUR: u32 = 0xDB6D_B6DC;

    #[test]
    fn test_biased_int_mult_takes_high_half() {
        let mut source = replay(&[0x8000_0000, u32::MAX, 0]);
        assert_eq!(biased_int_mult(&mut source, 7), 3);
        assert_eq!(biased_int_mult(&mut source, 7), 6);
        assert_eq!(biased_int_mult(&mut source, 7), 0);
        assert_eq!(source.drawn(), 3);
    }

    #[test]
    fn test_debiased_rejects_low_half_below_threshold() {
        for (name, strategy) in DEBIASED {
            // word 0 gives low half 0 < t = 4: rejected.
            let mut source = replay(&[0, 0x8000_0000]);
            assert_eq!(strategy(&mut source, 7), 3, "{name}");
            assert_eq!(source.drawn(), 2, "{name}");
        }
    }

    #[test]
    fn test_debiased_accepts_low_half_at_threshold() {
        for (name, strategy) in DEBIASED {
            let mut source = replay(&[LOW_HALF_FOUR]);
            assert_eq!(strategy(&mut source, 7), 6, "{name}");
            assert_eq!(source.drawn(), 1, "{name}");
        }
    }

    #[test]
    fn test_bopt_variants_reject_words_above_range() {
        let range = 0xC000_0000u32;
        let strategies: [Strategy32; 2] = [
            debiased_int_mult_topt_bopt,
            debiased_int_mult_topt_mopt_bopt,
        ];
        for strategy in strategies {
            let mut source = replay(&[0xFFFF_0000, 0x1234_5678]);
            assert_eq!(strategy(&mut source, range), 0x1234_5678);
            assert_eq!(source.drawn(), 2);
        }
    }

    #[test]
    fn test_range_max_with_bopt_returns_first_word_below_max() {
        for strategy in [DEBIASED[2].1, DEBIASED[4].1] {
            let mut source = replay(&[u32::MAX, 99]);
            assert_eq!(strategy(&mut source, u32::MAX), 99);
        }
    }

    #[test]
    fn test_wide_products() {
        let mut source = ReplaySource::new(vec![u64::MAX]);
        assert_eq!(biased_int_mult(&mut source, u64::MAX), u64::MAX - 1);
        // low half 2^63 is above range, so no threshold is needed
        let mut source = ReplaySource::new(vec![1u64 << 63]);
        assert_eq!(debiased_int_mult_topt(&mut source, 3u64), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: miri_case_count(),
            ..ProptestConfig::default()
        })]

        /// Property: the high half is always below range.
        #[test]
        fn prop_high_half_below_range(word in any::<u64>(), range in 1u64..) {
            let mut source = ReplaySource::new(vec![word]);
            prop_assert!(biased_int_mult(&mut source, range) < range);
        }

        /// Property: the unconditional-subtraction threshold is 2^W mod range.
        #[test]
        fn prop_bopt_threshold_matches_rem(range in 1u32..(1 << 31), word in any::<u32>()) {
            let (_, low) = Word::widening_mul(word, range);
            prop_assume!(low >= threshold_rem(range));
            let mut a = replay(&[word]);
            let mut b = replay(&[word]);
            prop_assert_eq!(
                debiased_int_mult_topt_mopt_bopt(&mut a, range),
                debiased_int_mult(&mut b, range)
            );
            prop_assert_eq!(a.drawn(), 1);
        }
    }
}
