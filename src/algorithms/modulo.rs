//! Debiased modulo strategies.
//!
//! `2^W` words do not split evenly into `range` residues: the lowest
//! `t = 2^W mod range` words would map one extra time onto the small residues.
//! The `x2` strategies reject exactly those words and then reduce (two `%` in
//! the worst case: one for `t`, one for the result). The `x1` strategies reduce
//! once and reject a word when it falls in the partial block at the top of the
//! word space, detected as `word - remainder > 2^W - range`.

use crate::source::BitSource;
use crate::word::Word;

/// `2^W mod range`, via conditional subtraction.
///
/// `2^W - range` is already the answer for `range > 2^(W-1)`, and one further
/// subtraction covers `range >= 2^W / 3`; only smaller ranges pay for `%`.
#[inline(always)]
pub(crate) fn threshold_mopt<W: Word>(range: W) -> W {
    let mut threshold = range.wrapping_neg();
    if threshold >= range {
        threshold = threshold - range;
        if threshold >= range {
            threshold = threshold % range;
        }
    }
    threshold
}

/// `2^W mod range`, via one `%`.
#[inline(always)]
pub(crate) fn threshold_rem<W: Word>(range: W) -> W {
    range.wrapping_neg() % range
}

/// `value mod range`, via conditional subtraction.
#[inline(always)]
fn reduce_mopt<W: Word>(mut value: W, range: W) -> W {
    if value >= range {
        value = value - range;
        if value >= range {
            value = value % range;
        }
    }
    value
}

/// Draws until the word is at least `threshold(range)`.
///
/// The threshold is computed only if `first` is below `range`: a word at or
/// above `range` is never below the threshold.
#[inline(always)]
fn redraw_below_threshold<S: BitSource>(
    source: &mut S,
    first: S::Word,
    range: S::Word,
    threshold: fn(S::Word) -> S::Word,
) -> S::Word {
    let mut word = first;
    if word < range {
        let threshold = threshold(range);
        while word < threshold {
            word = source.next_word();
        }
    }
    word
}

/// Rejects words below `2^W mod range`, then reduces with `%`.
#[inline]
pub fn debiased_mod_x2<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let threshold = threshold_rem(range);
    loop {
        let word = source.next_word();
        if word >= threshold {
            return word % range;
        }
    }
}

/// [`debiased_mod_x2`] with the threshold computed by [`threshold_mopt`].
#[inline]
pub fn debiased_mod_x2_mopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let threshold = threshold_mopt(range);
    loop {
        let word = source.next_word();
        if word >= threshold {
            return word % range;
        }
    }
}

/// Draws first and computes the threshold only when the draw is below `range`.
#[inline]
pub fn debiased_mod_x2_topt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    redraw_below_threshold(source, first, range, threshold_rem) % range
}

/// [`debiased_mod_x2_topt`], with plain rejection for `range >= 2^(W-1)`.
#[inline]
pub fn debiased_mod_x2_topt_bopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let mut word = source.next_word();
    if range >= S::Word::HALF {
        while word >= range {
            word = source.next_word();
        }
        return word;
    }
    redraw_below_threshold(source, word, range, threshold_rem) % range
}

/// [`debiased_mod_x2_topt`] with the [`threshold_mopt`] threshold.
#[inline]
pub fn debiased_mod_x2_topt_mopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    redraw_below_threshold(source, first, range, threshold_mopt) % range
}

/// [`debiased_mod_x2_topt_mopt`] that also reduces the result by conditional
/// subtraction.
#[inline]
pub fn debiased_mod_x2_topt_mopt_x2<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let first = source.next_word();
    reduce_mopt(
        redraw_below_threshold(source, first, range, threshold_mopt),
        range,
    )
}

/// Reduces once and rejects words from the partial top block.
#[inline]
pub fn debiased_mod_x1<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let limit = range.wrapping_neg();
    loop {
        let word = source.next_word();
        let remainder = word % range;
        if word.wrapping_sub(remainder) <= limit {
            return remainder;
        }
    }
}

/// [`debiased_mod_x1`], with plain rejection for `range >= 2^(W-1)`.
#[inline]
pub fn debiased_mod_x1_bopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    if range >= S::Word::HALF {
        loop {
            let word = source.next_word();
            if word < range {
                return word;
            }
        }
    }
    debiased_mod_x1(source, range)
}

/// [`debiased_mod_x1`] with the remainder computed by conditional subtraction.
#[inline]
pub fn debiased_mod_x1_mopt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let limit = range.wrapping_neg();
    loop {
        let word = source.next_word();
        let remainder = reduce_mopt(word, range);
        if word.wrapping_sub(remainder) <= limit {
            return remainder;
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
    use crate::source::{CountingSource, ReplaySource};
    use crate::test_config::miri_case_count;
    use proptest::prelude::*;

    type Strategy32 = fn(&mut CountingSource<ReplaySource<u32>>, u32) -> u32;

    fn replay(words: &[u32]) -> CountingSource<ReplaySource<u32>> {
        CountingSource::new(ReplaySource::new(words.to_vec()))
    }

    const X2: [(&str, Strategy32); 6] = [
        ("x2", debiased_mod_x2),
        ("x2-mopt", debiased_mod_x2_mopt),
        ("x2-topt", debiased_mod_x2_topt),
        ("x2-topt-bopt", debiased_mod_x2_topt_bopt),
        ("x2-topt-mopt", debiased_mod_x2_topt_mopt),
        ("x2-topt-mopt-x2", debiased_mod_x2_topt_mopt_x2),
    ];

    const X1: [(&str, Strategy32); 3] = [
        ("x1", debiased_mod_x1),
        ("x1-bopt", debiased_mod_x1_bopt),
        ("x1-mopt", debiased_mod_x1_mopt),
    ];

    #[test]
    fn test_thresholds_for_seven() {
        // 2^32 = 613566756 * 7 + 4
        assert_eq!(threshold_rem(7u32), 4);
        assert_eq!(threshold_mopt(7u32), 4);
        assert_eq!(threshold_mopt(1u32), 0);
        assert_eq!(threshold_mopt(1u32 << 31), 0);
        assert_eq!(threshold_mopt(3u64 << 62), 1 << 62);
    }

    #[test]
    fn test_x2_rejects_low_words() {
        for (name, strategy) in X2 {
            // 3 < t = 4 is rejected, 10 % 7 = 3 is kept.
            let mut source = replay(&[3, 10]);
            assert_eq!(strategy(&mut source, 7), 3, "{name}");
            assert_eq!(source.drawn(), 2, "{name}");

            // The top word is fine for x2: MAX % 7 = 3.
            let mut source = replay(&[u32::MAX]);
            assert_eq!(strategy(&mut source, 7), 3, "{name}");
            assert_eq!(source.drawn(), 1, "{name}");
        }
    }

    #[test]
    fn test_x1_rejects_top_block() {
        for (name, strategy) in X1 {
            // MAX - 3 = 2^32 - 4 > 2^32 - 7: partial block, rejected.
            let mut source = replay(&[u32::MAX, 10]);
            assert_eq!(strategy(&mut source, 7), 3, "{name}");
            assert_eq!(source.drawn(), 2, "{name}");

            // Low words are fine for x1.
            let mut source = replay(&[3]);
            assert_eq!(strategy(&mut source, 7), 3, "{name}");
            assert_eq!(source.drawn(), 1, "{name}");
        }
    }

    #[test]
    fn test_topt_accepts_small_word_above_threshold() {
        // 5 < range triggers the threshold, but 5 >= t = 4.
        for (name, strategy) in &X2[2..] {
            let mut source = replay(&[5]);
            assert_eq!(strategy(&mut source, 7), 5, "{name}");
            assert_eq!(source.drawn(), 1, "{name}");
        }
    }

    #[test]
    fn test_bopt_uses_plain_rejection_for_large_ranges() {
        let range = 0xC000_0000u32;
        let strategies: [Strategy32; 2] = [debiased_mod_x2_topt_bopt, debiased_mod_x1_bopt];
        for strategy in strategies {
            let mut source = replay(&[0xD000_0000, 0xFFFF_FFFF, 0x8000_0001]);
            assert_eq!(strategy(&mut source, range), 0x8000_0001);
            assert_eq!(source.drawn(), 3);
        }
    }

    #[test]
    fn test_range_max() {
        // Plain rejection and x1 both discard MAX itself.
        let rejecting: [Strategy32; 4] = [
            debiased_mod_x2_topt_bopt,
            debiased_mod_x1,
            debiased_mod_x1_bopt,
            debiased_mod_x1_mopt,
        ];
        for strategy in rejecting {
            let mut source = replay(&[u32::MAX, 12345]);
            assert_eq!(strategy(&mut source, u32::MAX), 12345);
        }

        // Threshold rejection discards only 0 and folds MAX onto 0.
        for (name, strategy) in X2.iter().filter(|(name, _)| *name != "x2-topt-bopt") {
            let mut source = replay(&[0, 12345]);
            assert_eq!(strategy(&mut source, u32::MAX), 12345, "{name}");
            let mut source = replay(&[u32::MAX]);
            assert_eq!(strategy(&mut source, u32::MAX), 0, "{name}");
        }
    }

    #[test]
    fn test_mopt_reduction_matches_remainder() {
        let mut source = replay(&[20]);
        assert_eq!(debiased_mod_x2_topt_mopt_x2(&mut source, 7), 6);
        let mut source = replay(&[13]);
        assert_eq!(debiased_mod_x1_mopt(&mut source, 7), 6);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: miri_case_count(),
            ..ProptestConfig::default()
        })]

        /// Property: both threshold computations agree.
        #[test]
        fn prop_threshold_mopt_matches_rem(range32 in 1u32.., range64 in 1u64..) {
            prop_assert_eq!(threshold_mopt(range32), threshold_rem(range32));
            prop_assert_eq!(threshold_mopt(range64), threshold_rem(range64));
            prop_assert_eq!(
                u128::from(threshold_rem(range64)),
                (1u128 << 64) % u128::from(range64)
            );
        }

        /// Property: conditional-subtraction reduction is a remainder.
        #[test]
        fn prop_reduce_mopt_matches_rem(value in any::<u64>(), range in 1u64..) {
            prop_assert_eq!(reduce_mopt(value, range), value % range);
        }

        /// Property: every modulo strategy returns the same value for the same
        /// word stream once the first word is acceptable to all of them.
        #[test]
        fn prop_accepted_first_word_agrees(word in any::<u32>(), range in 1u32..(1 << 31)) {
            let acceptable = word >= threshold_rem(range)
                && word.wrapping_sub(word % range) <= range.wrapping_neg();
            prop_assume!(acceptable);
            for (name, strategy) in X2.iter().chain(X1.iter()) {
                let mut source = replay(&[word]);
                prop_assert_eq!(strategy(&mut source, range), word % range, "{}", name);
                prop_assert_eq!(source.drawn(), 1);
            }
        }
    }
}
