//! Bitmask rejection.
//!
//! Masks each word down to the smallest power of two covering `range - 1` and
//! rejects results above it. No division or multiplication, at the cost of
//! up to (nearly) two draws per output on average.

use crate::source::BitSource;
use crate::word::Word;

/// Masks to the covering power of two and rejects values `> range - 1`.
///
/// For `range == 1` the `| 1` guard leaves a one-bit mask, so words with the
/// low bit set are rejected.
#[inline]
pub fn bitmask<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let top = range - S::Word::ONE;
    let mask = S::Word::MAX >> (top | S::Word::ONE).leading_zeros();
    loop {
        let value = source.next_word() & mask;
        if value <= top {
            return value;
        }
    }
}

/// [`bitmask`] that retries shifted copies of a rejected word.
///
/// When the mask leaves enough unused high bits, the rejected word is shifted
/// right by `W/2`, then by successively halved remainders
/// (`shift = W - (W - shift) / 2`), re-testing the masked value each time,
/// while the leading-zero count of `range - 1` is at least the shift.
///
/// Every shift applies to the drawn word, not to the previous window. The
/// guard keeps each window clear of the bits already tested, so retries are
/// independent of the rejections before them.
#[inline]
pub fn bitmask_alt<S: BitSource>(source: &mut S, range: S::Word) -> S::Word {
    let top = range - S::Word::ONE;
    let zeros = (top | S::Word::ONE).leading_zeros();
    let mask = S::Word::MAX >> zeros;
    loop {
        let word = source.next_word();
        let mut value = word & mask;
        if value <= top {
            return value;
        }
        let mut shift = S::Word::BITS / 2;
        while zeros >= shift {
            value = (word >> shift) & mask;
            if value <= top {
                return value;
            }
            shift = S::Word::BITS - (S::Word::BITS - shift) / 2;
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
    use crate::test_config::miri_sample_count;

    fn replay<W: Word>(words: &[W]) -> CountingSource<ReplaySource<W>> {
        CountingSource::new(ReplaySource::new(words.to_vec()))
    }

    #[test]
    fn test_bitmask_rejects_above_top() {
        // range 5: mask 0b111, top 4
        let mut source = replay(&[7u32, 6, 4]);
        assert_eq!(bitmask(&mut source, 5), 4);
        assert_eq!(source.drawn(), 3);
    }

    #[test]
    fn test_bitmask_power_of_two_never_rejects() {
        let mut source = CountingSource::new(Pcg64::seed_from_u64(8));
        for _ in 0..100 {
            assert!(bitmask(&mut source, 1u64 << 33) < 1 << 33);
        }
        assert_eq!(source.drawn(), 100);
    }

    #[test]
    fn test_bitmask_range_one_rejects_odd_words() {
        let mut source = replay(&[1u64, 3, 8]);
        assert_eq!(bitmask(&mut source, 1), 0);
        assert_eq!(source.drawn(), 3);
    }

    #[test]
    fn test_bitmask_alt_reuses_high_bits() {
        // low three bits 7 are rejected; bits 16.. give 2
        let mut source = replay(&[0x0002_0007u32]);
        assert_eq!(bitmask_alt(&mut source, 5), 2);
        assert_eq!(source.drawn(), 1);
    }

    #[test]
    fn test_bitmask_alt_windows_come_from_the_drawn_word() {
        // range 5, mask 0b111: bits 0..3 and 16..19 are 7, bits 24..27 are 3
        let mut source = replay(&[0x0307_0007u32]);
        assert_eq!(bitmask_alt(&mut source, 5), 3);
        assert_eq!(source.drawn(), 1);

        // 64-bit: bits 0.., 32.. and 48.. mask to 7, bits 56.. give 2
        let mut source = replay(&[0x0207_0007_0000_0007u64]);
        assert_eq!(bitmask_alt(&mut source, 5), 2);
        assert_eq!(source.drawn(), 1);
    }

    #[test]
    fn test_bitmask_alt_all_ones_word_forces_a_redraw() {
        // every window of an all-ones word masks to 3, above top 2
        let mut source = replay(&[u32::MAX, 1]);
        assert_eq!(bitmask_alt(&mut source, 3), 1);
        assert_eq!(source.drawn(), 2);

        let mut source = replay(&[u64::MAX, 2]);
        assert_eq!(bitmask_alt(&mut source, 3), 2);
        assert_eq!(source.drawn(), 2);

        let mut source = replay(&[u32::MAX, 4]);
        assert_eq!(bitmask_alt(&mut source, 5), 4);
        assert_eq!(source.drawn(), 2);
    }

    #[test]
    fn test_bitmask_alt_redraws_when_mask_is_wide() {
        // range - 1 = 0x1_0000 has 15 leading zeros: no room for a 16-bit shift.
        let mut source = replay(&[0x0001_FFFFu32, 0x0000_0042]);
        assert_eq!(bitmask_alt(&mut source, 0x1_0001), 0x42);
        assert_eq!(source.drawn(), 2);
    }

    #[test]
    fn test_bitmask_alt_matches_bitmask_on_first_acceptance() {
        let mut a = replay(&[3u32]);
        let mut b = replay(&[3u32]);
        assert_eq!(bitmask(&mut a, 5), bitmask_alt(&mut b, 5));
    }

    /// Counts `draws` values at range 3; a stuck window shows up as excess zeros.
    fn range_three_counts<S, F>(mut source: S, draws: usize, sample: F) -> [usize; 3]
    where
        S: BitSource,
        F: Fn(&mut S, S::Word) -> S::Word,
    {
        let mut counts = [0usize; 3];
        for _ in 0..draws {
            let value = sample(&mut source, S::Word::from_u32(3));
            counts[value.as_u64() as usize] += 1;
        }
        counts
    }

    fn assert_even_thirds(name: &str, counts: [usize; 3], draws: usize) {
        assert_eq!(counts.iter().sum::<usize>(), draws, "{name}");
        if cfg!(miri) {
            return;
        }
        let expected = draws as f64 / 3.0;
        for (value, &count) in counts.iter().enumerate() {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation <= 0.05, "{name}: value {value} drawn {count} times of {draws}");
        }
    }

    #[test]
    fn test_range_three_is_even_at_both_widths() {
        let draws = miri_sample_count(30_000);
        assert_even_thirds("bitmask/32", range_three_counts(Pcg32::seed_from_u64(3), draws, bitmask), draws);
        assert_even_thirds("bitmask-alt/32", range_three_counts(Pcg32::seed_from_u64(3), draws, bitmask_alt), draws);
        assert_even_thirds("bitmask/64", range_three_counts(Pcg64::seed_from_u64(3), draws, bitmask), draws);
        assert_even_thirds("bitmask-alt/64", range_three_counts(Pcg64::seed_from_u64(3), draws, bitmask_alt), draws);
    }
}
