//! Fixed-width unsigned words produced by a bit source.
//!
//! Every bounded-rand strategy is written once against [`Word`] and
//! monomorphised for `u32` and `u64`. The trait exposes exactly the arithmetic
//! the strategies need: wraparound negation and subtraction, the double-width
//! product, a leading-zero count, and the two floating-point scalings used by
//! the biased baselines.
//!
//! # Wraparound
//!
//! `(-range)` is always computed with [`Word::wrapping_neg`]. For `range > 0`
//! this is `2^W - range`, and `(-range) % range` is `2^W mod range`, the size
//! of the biased overhang that rejection sampling has to discard.

use rand::distributions::uniform::SampleUniform;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add, AddAssign, BitAnd, BitOr, Div, Not, Rem, Shl, Shr, Sub};

/// An unsigned machine word of `BITS` bits with wraparound helpers.
///
/// Implemented for `u32` and `u64` only.
pub trait Word:
    Copy
    + Eq
    + Ord
    + Hash
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + SampleUniform
{
    /// Double-width accumulator used for checksums.
    type Accumulator: Copy + Default + Debug + Display + Eq + AddAssign + From<Self> + Into<u128>;

    /// Width of the word in bits.
    const BITS: u32;
    /// The value `0`.
    const ZERO: Self;
    /// The value `1`.
    const ONE: Self;
    /// The value `2^W - 1`.
    const MAX: Self;
    /// The value `2^(W-1)`; ranges at or above it are handled by plain rejection
    /// in the boundary-optimised strategies.
    const HALF: Self;

    /// `2^W - self`, wrapping.
    fn wrapping_neg(self) -> Self;
    /// `self - rhs`, wrapping.
    fn wrapping_sub(self, rhs: Self) -> Self;
    /// `self + rhs`, wrapping.
    fn wrapping_add(self, rhs: Self) -> Self;
    /// Number of leading zero bits.
    fn leading_zeros(self) -> u32;
    /// Full `2W`-bit product, returned as `(high, low)` halves.
    fn widening_mul(self, rhs: Self) -> (Self, Self);
    /// Zero-extends a `u32`.
    fn from_u32(value: u32) -> Self;
    /// Truncates a `u64` to the word width.
    fn from_u64_truncating(value: u64) -> Self;
    /// Zero-extends (or, for `u64`, passes through) to `u64`.
    fn as_u64(self) -> u64;
    /// Zero-extends to `u128`.
    fn as_u128(self) -> u128;

    /// `range * ldexp(self, -W)`, truncated.
    ///
    /// Biased baseline. The result is clamped below `range`.
    fn scale_ldexp(self, range: Self) -> Self;
    /// `range * (self * 2^-W)`, truncated.
    ///
    /// Biased baseline. The result is clamped below `range`.
    fn scale_constant(self, range: Self) -> Self;

    /// Repeats the bits of `value` across the whole word.
    ///
    /// For `u32` this is `value`; for `u64` it is `(value << 32) | value`.
    #[must_use]
    fn spread_u32(value: u32) -> Self {
        let mut word = Self::from_u32(value);
        let mut filled = 32;
        while filled < Self::BITS {
            word = (word << filled) | word;
            filled *= 2;
        }
        word
    }
}

/// Multiplies `value` by `2^exp` by adjusting its exponent field.
///
/// Covers zero and normal inputs whose result stays normal, which holds for
/// every integer word scaled by `2^-W`. Subnormal, infinite and NaN inputs are
/// out of scope.
#[inline]
fn ldexp(value: f64, exp: i32) -> f64 {
    const EXPONENT_MASK: u64 = 0x7ff << 52;
    if value == 0.0 {
        return value;
    }
    debug_assert!(value.is_normal(), "ldexp of non-normal {value}");
    let bits = value.to_bits();
    let biased = ((bits & EXPONENT_MASK) >> 52) as i32 + exp;
    debug_assert!(biased > 0 && biased < 0x7ff, "ldexp leaves the normal range");
    f64::from_bits((bits & !EXPONENT_MASK) | ((biased as u64) << 52))
}

/// `2^-32`, exactly representable.
const SCALE_32: f64 = 1.0 / 4_294_967_296.0;
/// `2^-64`, exactly representable.
const SCALE_64: f64 = 1.0 / 18_446_744_073_709_551_616.0;

impl Word for u32 {
    type Accumulator = u64;

    const BITS: u32 = 32;
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const MAX: Self = u32::MAX;
    const HALF: Self = 1 << 31;

    #[inline(always)]
    fn wrapping_neg(self) -> Self {
        Self::wrapping_neg(self)
    }

    #[inline(always)]
    fn wrapping_sub(self, rhs: Self) -> Self {
        Self::wrapping_sub(self, rhs)
    }

    #[inline(always)]
    fn wrapping_add(self, rhs: Self) -> Self {
        Self::wrapping_add(self, rhs)
    }

    #[inline(always)]
    fn leading_zeros(self) -> u32 {
        Self::leading_zeros(self)
    }

    #[inline(always)]
    fn widening_mul(self, rhs: Self) -> (Self, Self) {
        let product = u64::from(self) * u64::from(rhs);
        ((product >> 32) as Self, product as Self)
    }

    #[inline(always)]
    fn from_u32(value: u32) -> Self {
        value
    }

    #[inline(always)]
    fn from_u64_truncating(value: u64) -> Self {
        value as Self
    }

    #[inline(always)]
    fn as_u64(self) -> u64 {
        u64::from(self)
    }

    #[inline(always)]
    fn as_u128(self) -> u128 {
        u128::from(self)
    }

    // f64 holds a 32-bit word exactly and the product stays at least 2^20 ulps
    // below `range`, so truncation never reaches `range`.
    #[inline]
    fn scale_ldexp(self, range: Self) -> Self {
        let zero_one = ldexp(f64::from(self), -32);
        (f64::from(range) * zero_one) as Self
    }

    #[inline]
    fn scale_constant(self, range: Self) -> Self {
        let zero_one = SCALE_32 * f64::from(self);
        (f64::from(range) * zero_one) as Self
    }
}

impl Word for u64 {
    type Accumulator = u128;

    const BITS: u32 = 64;
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const MAX: Self = u64::MAX;
    const HALF: Self = 1 << 63;

    #[inline(always)]
    fn wrapping_neg(self) -> Self {
        Self::wrapping_neg(self)
    }

    #[inline(always)]
    fn wrapping_sub(self, rhs: Self) -> Self {
        Self::wrapping_sub(self, rhs)
    }

    #[inline(always)]
    fn wrapping_add(self, rhs: Self) -> Self {
        Self::wrapping_add(self, rhs)
    }

    #[inline(always)]
    fn leading_zeros(self) -> u32 {
        Self::leading_zeros(self)
    }

    #[inline(always)]
    fn widening_mul(self, rhs: Self) -> (Self, Self) {
        let product = u128::from(self) * u128::from(rhs);
        ((product >> 64) as Self, product as Self)
    }

    #[inline(always)]
    fn from_u32(value: u32) -> Self {
        Self::from(value)
    }

    #[inline(always)]
    fn from_u64_truncating(value: u64) -> Self {
        value
    }

    #[inline(always)]
    fn as_u64(self) -> u64 {
        self
    }

    #[inline(always)]
    fn as_u128(self) -> u128 {
        u128::from(self)
    }

    // A 64-bit word does not fit in f64: the word itself and the product can
    // both round up, so wide ranges can land on `range` and are clamped.
    #[inline]
    fn scale_ldexp(self, range: Self) -> Self {
        let zero_one = ldexp(self as f64, -64);
        ((range as f64 * zero_one) as Self).min(range - 1)
    }

    #[inline]
    fn scale_constant(self, range: Self) -> Self {
        let zero_one = SCALE_64 * self as f64;
        ((range as f64 * zero_one) as Self).min(range - 1)
    }
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use crate::test_config::miri_case_count;
    use proptest::prelude::*;

    #[test]
    fn test_wrapping_neg_is_overhang_complement() {
        assert_eq!(Word::wrapping_neg(7u32), u32::MAX - 6);
        assert_eq!(Word::wrapping_neg(1u64), u64::MAX);
        // (-range) % range == 2^W mod range
        assert_eq!(Word::wrapping_neg(7u32) % 7, ((1u64 << 32) % 7) as u32);
        assert_eq!(Word::wrapping_neg(10u64) % 10, ((1u128 << 64) % 10) as u64);
    }

    #[test]
    fn test_widening_mul_halves() {
        assert_eq!(Word::widening_mul(u32::MAX, u32::MAX), (u32::MAX - 1, 1));
        assert_eq!(Word::widening_mul(1u32 << 31, 4u32), (2, 0));
        assert_eq!(Word::widening_mul(u64::MAX, 2u64), (1, u64::MAX - 1));
        assert_eq!(Word::widening_mul(0u64, u64::MAX), (0, 0));
    }

    #[test]
    fn test_half_constant() {
        assert_eq!(<u32 as Word>::HALF, 0x8000_0000);
        assert_eq!(<u64 as Word>::HALF, 0x8000_0000_0000_0000);
    }

    #[test]
    fn test_spread_u32() {
        assert_eq!(<u32 as Word>::spread_u32(0x1234_5678), 0x1234_5678);
        assert_eq!(<u64 as Word>::spread_u32(0x1234_5678), 0x1234_5678_1234_5678);
        assert_eq!(<u64 as Word>::spread_u32(1), 0x0000_0001_0000_0001);
    }

    #[test]
    fn test_ldexp_matches_multiplication() {
        for value in [1.0, 3.0, 12345.0, 4_294_967_295.0, 1.8e19] {
            assert_eq!(ldexp(value, -32), value * SCALE_32);
            assert_eq!(ldexp(value, -64), value * SCALE_64);
        }
        assert_eq!(ldexp(0.0, -32), 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: miri_case_count(),
            ..ProptestConfig::default()
        })]

        /// Property: on every word, the exponent shortcut is exact scaling.
        #[test]
        fn prop_ldexp_matches_multiplication(narrow in any::<u32>(), wide in any::<u64>()) {
            prop_assert_eq!(ldexp(f64::from(narrow), -32), f64::from(narrow) * SCALE_32);
            prop_assert_eq!(ldexp(wide as f64, -64), wide as f64 * SCALE_64);
        }
    }

    #[test]
    fn test_scale_ldexp_and_constant_agree_32() {
        for (word, range) in [(0u32, 7u32), (u32::MAX, 7), (u32::MAX, u32::MAX), (1 << 31, 10)] {
            assert_eq!(word.scale_ldexp(range), word.scale_constant(range));
        }
    }

    #[test]
    fn test_scale_stays_below_range_at_the_top() {
        assert_eq!(u32::MAX.scale_constant(u32::MAX), u32::MAX - 1);
        assert!(u64::MAX.scale_constant(u64::MAX) < u64::MAX);
        assert!(u64::MAX.scale_ldexp(u64::MAX - 1) < u64::MAX - 1);
        assert_eq!(u64::MAX.scale_ldexp(1), 0);
    }

    #[test]
    fn test_scale_of_half_word() {
        // 2^(W-1) maps to exactly half of an even range.
        assert_eq!((1u32 << 31).scale_constant(100), 50);
        assert_eq!((1u64 << 63).scale_constant(100), 50);
    }
}
