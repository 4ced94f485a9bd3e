//! The bounded-rand strategy catalog.
//!
//! Every strategy maps a uniform word source and a `range > 0` to a value in
//! `[0, range)`. They differ in how they trade divisions, multiplications and
//! redraws, and four of them ([`Algorithm::is_biased`]) do not produce a
//! uniform result at all and exist only as baselines.
//!
//! Strategies are plain generic functions, one per [`Algorithm`] variant,
//! grouped by technique:
//!
//! - [`baseline`]: the ready-made `rand` distribution, floating-point scaling,
//!   plain modulo and the division method.
//! - [`modulo`]: threshold (`x2`) and single-remainder (`x1`) rejection.
//! - [`multiply`]: integer multiplication with Lemire's rejection.
//! - [`bitmask`]: power-of-two masking with rejection.
//!
//! # Optimisation tags
//!
//! - **TOPT** draws first and computes the threshold only when the first draw
//!   lands in the region where it matters.
//! - **MOPT** computes `2^W mod range` by conditional subtraction and only
//!   falls back to `%` when that is not enough.
//! - **BOPT** switches to plain rejection for `range >= 2^(W-1)`.
//!
//! # Dispatch
//!
//! [`Algorithm::visit`] resolves the variant once and hands the concrete
//! strategy function to a [`StrategyVisitor`], so a whole benchmark loop is
//! compiled per strategy with no per-call branch. [`Algorithm::sample`] is the
//! convenience form for one-off draws.
//!
//! # Preconditions
//!
//! `range == 0` is never checked. Strategies may panic (division by zero) or
//! loop forever when given it.

use crate::source::BitSource;
use crate::BenchError;
use std::fmt;
use std::str::FromStr;

pub mod baseline;
pub mod bitmask;
pub mod modulo;
pub mod multiply;

/// The technique a strategy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// The `rand` crate's `Uniform` distribution.
    Reference,
    /// Multiply by a floating-point fraction in `[0, 1)`.
    BiasedFloat,
    /// Plain `word % range`.
    BiasedModulo,
    /// Divide by `floor(2^W / range)` and reject.
    DebiasedDivision,
    /// Reject below `2^W mod range`, then reduce.
    DebiasedModuloX2,
    /// Reduce once, reject on the remainder.
    DebiasedModuloX1,
    /// High half of `word * range`.
    BiasedMultiply,
    /// High half of `word * range`, rejecting on the low half.
    DebiasedMultiply,
    /// Mask to the next power of two and reject.
    Bitmask,
}

impl Family {
    /// Returns a string representation suitable for reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::BiasedFloat => "biased-float",
            Self::BiasedModulo => "biased-modulo",
            Self::DebiasedDivision => "debiased-division",
            Self::DebiasedModuloX2 => "debiased-modulo-x2",
            Self::DebiasedModuloX1 => "debiased-modulo-x1",
            Self::BiasedMultiply => "biased-multiply",
            Self::DebiasedMultiply => "debiased-multiply",
            Self::Bitmask => "bitmask",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the concrete strategy function chosen by [`Algorithm::visit`].
///
/// `strategy` is a zero-sized function item, so code generic over `F` is
/// instantiated once per algorithm and the strategy inlines into it.
pub trait StrategyVisitor<S: BitSource> {
    /// What the visit produces.
    type Output;

    /// Called exactly once with the selected strategy.
    fn visit<F>(self, algorithm: Algorithm, strategy: F) -> Self::Output
    where
        F: Fn(&mut S, S::Word) -> S::Word;
}

macro_rules! catalog {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $name:literal, $family:ident, $module:ident::$function:ident,
            biased: $biased:literal, single_word: $single:literal;
    )+) => {
        /// A bounded-rand strategy, selected once per run.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum Algorithm {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl Algorithm {
            /// Every strategy, in catalog order.
            pub const ALL: &'static [Algorithm] = &[$(Algorithm::$variant),+];

            /// Kebab-case name used on the command line and in reports.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// The technique this strategy belongs to.
            #[must_use]
            pub const fn family(self) -> Family {
                match self {
                    $(Self::$variant => Family::$family,)+
                }
            }

            /// Whether the output distribution is knowingly non-uniform.
            #[must_use]
            pub const fn is_biased(self) -> bool {
                match self {
                    $(Self::$variant => $biased,)+
                }
            }

            /// Whether every call consumes exactly one word.
            #[must_use]
            pub const fn draws_single_word(self) -> bool {
                match self {
                    $(Self::$variant => $single,)+
                }
            }

            /// Draws one value in `[0, range)` with this strategy.
            ///
            /// Branches on the variant each call; loops should prefer
            /// [`visit`](Self::visit).
            #[inline]
            pub fn sample<S: BitSource>(self, source: &mut S, range: S::Word) -> S::Word {
                match self {
                    $(Self::$variant => $module::$function(source, range),)+
                }
            }

            /// Hands the concrete strategy function to `visitor`.
            pub fn visit<S, V>(self, visitor: V) -> V::Output
            where
                S: BitSource,
                V: StrategyVisitor<S>,
            {
                match self {
                    $(Self::$variant => visitor.visit(self, $module::$function::<S>),)+
                }
            }
        }
    };
}

catalog! {
    /// `rand`'s `Uniform` distribution driven by the bit source.
    Reference => "reference", Reference, baseline::reference,
        biased: false, single_word: false;
    /// `range * ldexp(word, -W)`.
    BiasedFpMultLdexp => "biased-fp-mult-ldexp", BiasedFloat, baseline::biased_fp_mult_ldexp,
        biased: true, single_word: true;
    /// `range * (word * 2^-W)`.
    BiasedFpMultScale => "biased-fp-mult-scale", BiasedFloat, baseline::biased_fp_mult_scale,
        biased: true, single_word: true;
    /// `word % range`.
    BiasedMod => "biased-mod", BiasedModulo, baseline::biased_mod,
        biased: true, single_word: true;
    /// `word / (floor((2^W - range) / range) + 1)`, rejecting results `>= range`.
    DebiasedDiv => "debiased-div", DebiasedDivision, baseline::debiased_div,
        biased: false, single_word: false;
    /// Reject words below `2^W mod range`, then `% range`.
    DebiasedModX2 => "debiased-mod-x2", DebiasedModuloX2, modulo::debiased_mod_x2,
        biased: false, single_word: false;
    /// [`DebiasedModX2`](Self::DebiasedModX2) with the MOPT threshold.
    DebiasedModX2Mopt => "debiased-mod-x2-mopt", DebiasedModuloX2, modulo::debiased_mod_x2_mopt,
        biased: false, single_word: false;
    /// [`DebiasedModX2`](Self::DebiasedModX2) computing the threshold lazily.
    DebiasedModX2Topt => "debiased-mod-x2-topt", DebiasedModuloX2, modulo::debiased_mod_x2_topt,
        biased: false, single_word: false;
    /// TOPT with the large-range BOPT fallback.
    DebiasedModX2ToptBopt => "debiased-mod-x2-topt-bopt", DebiasedModuloX2, modulo::debiased_mod_x2_topt_bopt,
        biased: false, single_word: false;
    /// TOPT with the MOPT threshold.
    DebiasedModX2ToptMopt => "debiased-mod-x2-topt-mopt", DebiasedModuloX2, modulo::debiased_mod_x2_topt_mopt,
        biased: false, single_word: false;
    /// TOPT with MOPT applied to both the threshold and the output reduction.
    DebiasedModX2ToptMoptX2 => "debiased-mod-x2-topt-mopt-x2", DebiasedModuloX2, modulo::debiased_mod_x2_topt_mopt_x2,
        biased: false, single_word: false;
    /// Reduce once; reject when `word - remainder > 2^W - range`.
    DebiasedModX1 => "debiased-mod-x1", DebiasedModuloX1, modulo::debiased_mod_x1,
        biased: false, single_word: false;
    /// [`DebiasedModX1`](Self::DebiasedModX1) with the BOPT fallback.
    DebiasedModX1Bopt => "debiased-mod-x1-bopt", DebiasedModuloX1, modulo::debiased_mod_x1_bopt,
        biased: false, single_word: false;
    /// [`DebiasedModX1`](Self::DebiasedModX1) reducing by conditional subtraction.
    DebiasedModX1Mopt => "debiased-mod-x1-mopt", DebiasedModuloX1, modulo::debiased_mod_x1_mopt,
        biased: false, single_word: false;
    /// `(word * range) >> W`.
    BiasedIntMult => "biased-int-mult", BiasedMultiply, multiply::biased_int_mult,
        biased: true, single_word: true;
    /// Lemire's method: reject products whose low half is below `2^W mod range`.
    DebiasedIntMult => "debiased-int-mult", DebiasedMultiply, multiply::debiased_int_mult,
        biased: false, single_word: false;
    /// Lemire's method computing the threshold lazily.
    #[default]
    DebiasedIntMultTopt => "debiased-int-mult-topt", DebiasedMultiply, multiply::debiased_int_mult_topt,
        biased: false, single_word: false;
    /// TOPT with the BOPT fallback.
    DebiasedIntMultToptBopt => "debiased-int-mult-topt-bopt", DebiasedMultiply, multiply::debiased_int_mult_topt_bopt,
        biased: false, single_word: false;
    /// TOPT with the MOPT threshold.
    DebiasedIntMultToptMopt => "debiased-int-mult-topt-mopt", DebiasedMultiply, multiply::debiased_int_mult_topt_mopt,
        biased: false, single_word: false;
    /// TOPT, MOPT and BOPT combined.
    DebiasedIntMultToptMoptBopt => "debiased-int-mult-topt-mopt-bopt", DebiasedMultiply, multiply::debiased_int_mult_topt_mopt_bopt,
        biased: false, single_word: false;
    /// Mask to the smallest covering power of two, reject `> range - 1`.
    Bitmask => "bitmask", Bitmask, bitmask::bitmask,
        biased: false, single_word: false;
    /// [`Bitmask`](Self::Bitmask) that retries shifted copies of a rejected word.
    BitmaskAlt => "bitmask-alt", Bitmask, bitmask::bitmask_alt,
        biased: false, single_word: false;
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = BenchError;

    /// Parses a catalog name. Matching ignores case and treats `_` as `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| BenchError::UnknownAlgorithm { name: s.to_owned() })
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
    use crate::source::{CountingSource, Pcg32, Pcg64, SeedableSource};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_complete_and_unique() {
        assert_eq!(Algorithm::ALL.len(), 22);
        let names: HashSet<&str> = Algorithm::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names.len(), Algorithm::ALL.len());
    }

    #[test]
    fn test_biased_set() {
        let biased: Vec<Algorithm> = Algorithm::ALL
            .iter()
            .copied()
            .filter(|a| a.is_biased())
            .collect();
        assert_eq!(
            biased,
            vec![
                Algorithm::BiasedFpMultLdexp,
                Algorithm::BiasedFpMultScale,
                Algorithm::BiasedMod,
                Algorithm::BiasedIntMult,
            ]
        );
        // The biased baselines are exactly the single-draw ones.
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.is_biased(), algorithm.draws_single_word());
        }
    }

    #[test]
    fn test_name_round_trips_through_from_str() {
        for &algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
            assert_eq!(algorithm.to_string(), algorithm.name());
        }
        assert_eq!(
            "DEBIASED_MOD_X2_TOPT".parse::<Algorithm>().unwrap(),
            Algorithm::DebiasedModX2Topt
        );
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        match "lemire".parse::<Algorithm>() {
            Err(BenchError::UnknownAlgorithm { name }) => assert_eq!(name, "lemire"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(Algorithm::Reference.family(), Family::Reference);
        assert_eq!(Algorithm::DebiasedDiv.family(), Family::DebiasedDivision);
        assert_eq!(Algorithm::DebiasedModX1Mopt.family(), Family::DebiasedModuloX1);
        assert_eq!(
            Algorithm::DebiasedIntMultToptMoptBopt.family(),
            Family::DebiasedMultiply
        );
        assert_eq!(Algorithm::BitmaskAlt.family(), Family::Bitmask);
        assert_eq!(Family::DebiasedModuloX2.to_string(), "debiased-modulo-x2");
    }

    struct CollectSamples {
        range: u64,
        count: usize,
        seed: u64,
    }

    impl StrategyVisitor<Pcg64> for CollectSamples {
        type Output = (Algorithm, Vec<u64>);

        fn visit<F>(self, algorithm: Algorithm, strategy: F) -> Self::Output
        where
            F: Fn(&mut Pcg64, u64) -> u64,
        {
            let mut source = Pcg64::seed_from_u64(self.seed);
            let values = (0..self.count)
                .map(|_| strategy(&mut source, self.range))
                .collect();
            (algorithm, values)
        }
    }

    #[test]
    fn test_visit_matches_sample() {
        for &algorithm in Algorithm::ALL {
            let (seen, visited) = algorithm.visit::<Pcg64, _>(CollectSamples {
                range: 1_000_003,
                count: 64,
                seed: 11,
            });
            assert_eq!(seen, algorithm);

            let mut source = Pcg64::seed_from_u64(11);
            let sampled: Vec<u64> = (0..64)
                .map(|_| algorithm.sample(&mut source, 1_000_003))
                .collect();
            assert_eq!(visited, sampled, "{algorithm}");
        }
    }

    #[test]
    fn test_range_one_returns_zero_for_every_algorithm() {
        for &algorithm in Algorithm::ALL {
            let mut source = CountingSource::new(Pcg32::seed_from_u64(5));
            for _ in 0..32 {
                assert_eq!(algorithm.sample(&mut source, 1u32), 0, "{algorithm}");
            }
            match algorithm {
                Algorithm::DebiasedDiv => assert_eq!(source.drawn(), 0),
                Algorithm::Bitmask | Algorithm::BitmaskAlt => assert!(source.drawn() >= 32),
                _ => assert_eq!(source.drawn(), 32, "{algorithm}"),
            }
        }
    }
}
