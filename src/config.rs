//! Configuration for a benchmark run.
//!
//! | Type | Purpose | Key Presets |
//! |------|---------|-------------|
//! | `BenchConfig` | Everything one run needs | `full()`, `quick()`, `smoke()` |
//! | `Width` | Word width of source and ranges | `W32`, `W64` |
//! | `ScalePreset` | Named workload sizes | `Full`, `Quick`, `Smoke` |
//! | `SeedPolicy` | Where the seed comes from | `Fixed`, `Entropy` |
//!
//! # Example
//!
//! ```
//! use bounded_rand::{Algorithm, BenchConfig, SeedPolicy, Width};
//!
//! let config = BenchConfig::smoke()
//!     .with_width(Width::W64)
//!     .with_algorithm(Algorithm::BitmaskAlt)
//!     .with_seed(SeedPolicy::Fixed(42));
//! assert!(config.validate().is_ok());
//! ```

use crate::algorithms::Algorithm;
use crate::source::entropy_seed;
use crate::workload::WorkloadScale;
use crate::BenchError;
use std::fmt;
use std::str::FromStr;

/// Word width of the bit source and of every range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum Width {
    /// `u32` words, `u64` checksums.
    #[default]
    W32,
    /// `u64` words, `u128` checksums.
    W64,
}

impl Width {
    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Looks up a width by bit count.
    pub fn from_bits(bits: u32) -> Result<Self, BenchError> {
        match bits {
            32 => Ok(Self::W32),
            64 => Ok(Self::W64),
            _ => Err(BenchError::UnsupportedWidth { bits }),
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Named workload sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalePreset {
    /// The full-size benchmark for the chosen width.
    Full,
    /// [`WorkloadScale::quick`].
    Quick,
    /// [`WorkloadScale::reduced`].
    #[default]
    Smoke,
}

impl ScalePreset {
    /// The workload sizes this preset stands for at `width`.
    #[must_use]
    pub const fn scale_for(self, width: Width) -> WorkloadScale {
        match (self, width) {
            (Self::Full, Width::W32) => WorkloadScale::full_32(),
            (Self::Full, Width::W64) => WorkloadScale::full_64(),
            (Self::Quick, _) => WorkloadScale::quick(),
            (Self::Smoke, _) => WorkloadScale::reduced(),
        }
    }
}

impl FromStr for ScalePreset {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "quick" => Ok(Self::Quick),
            "smoke" => Ok(Self::Smoke),
            other => Err(BenchError::InvalidConfig {
                info: format!("unknown scale {other:?}; expected full, quick or smoke"),
            }),
        }
    }
}

/// Where the run's seed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeedPolicy {
    /// A given seed.
    Fixed(u64),
    /// Two 32-bit reads of the OS entropy source.
    #[default]
    Entropy,
}

impl SeedPolicy {
    /// Produces the seed, reading the OS entropy source if needed.
    pub fn resolve(self) -> Result<u64, BenchError> {
        match self {
            Self::Fixed(seed) => Ok(seed),
            Self::Entropy => entropy_seed(),
        }
    }
}

/// Parses a seed the way C's `strtoul` with base 0 picks a radix: `0x`/`0X`
/// prefix is hexadecimal, any other leading `0` is octal, otherwise decimal.
///
/// Unlike `strtoul`, the whole string must be a valid number in that radix.
///
/// # Example
///
/// ```
/// use bounded_rand::config::parse_seed;
///
/// assert_eq!(parse_seed("42").unwrap(), 42);
/// assert_eq!(parse_seed("0x2a").unwrap(), 42);
/// assert_eq!(parse_seed("052").unwrap(), 42);
/// assert!(parse_seed("42abc").is_err());
/// ```
pub fn parse_seed(text: &str) -> Result<u64, BenchError> {
    let trimmed = text.trim();
    let (digits, radix) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(BenchError::InvalidSeed {
            input: text.to_owned(),
        });
    }
    u64::from_str_radix(digits, radix).map_err(|_| BenchError::InvalidSeed {
        input: text.to_owned(),
    })
}

/// Everything one benchmark run needs.
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. Construct it
/// through a preset and the `with_*` methods, or with `..BenchConfig::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "BenchConfig has no effect unless passed to run_benchmark()"]
pub struct BenchConfig {
    /// Word width of the source and ranges.
    ///
    /// Default: [`Width::W32`]
    pub width: Width,

    /// The strategy under test.
    ///
    /// Default: [`Algorithm::DebiasedIntMultTopt`]
    pub algorithm: Algorithm,

    /// Seed for the bit source.
    ///
    /// Default: [`SeedPolicy::Entropy`]
    pub seed: SeedPolicy,

    /// Workload sizes.
    ///
    /// Default: [`WorkloadScale::reduced`]
    pub scale: WorkloadScale,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            width: Width::default(),
            algorithm: Algorithm::default(),
            seed: SeedPolicy::default(),
            scale: ScalePreset::default().scale_for(Width::default()),
        }
    }
}

impl BenchConfig {
    /// Creates a new `BenchConfig` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full-size 32-bit benchmark.
    pub fn full() -> Self {
        Self::default().with_preset(ScalePreset::Full)
    }

    /// Same shapes as [`full`](Self::full), about a sixteenth of the work.
    pub fn quick() -> Self {
        Self::default().with_preset(ScalePreset::Quick)
    }

    /// Sized for tests; finishes in well under a second per algorithm.
    pub fn smoke() -> Self {
        Self::default().with_preset(ScalePreset::Smoke)
    }

    /// Sets the word width, rescaling if the scale is a full-size preset.
    pub fn with_width(mut self, width: Width) -> Self {
        if self.scale == ScalePreset::Full.scale_for(self.width) {
            self.scale = ScalePreset::Full.scale_for(width);
        }
        self.width = width;
        self
    }

    /// Sets the strategy under test.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the seed policy.
    pub fn with_seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    /// Sets explicit workload sizes.
    pub fn with_scale(mut self, scale: WorkloadScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the workload sizes from a preset for the current width.
    pub fn with_preset(mut self, preset: ScalePreset) -> Self {
        self.scale = preset.scale_for(self.width);
        self
    }

    /// Checks that the workload plan for this width is non-empty and never
    /// yields a zero range.
    pub fn validate(&self) -> Result<(), BenchError> {
        match self.width {
            Width::W32 => self.scale.plan::<u32>().map(drop),
            Width::W64 => self.scale.plan::<u64>().map(drop),
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

    #[test]
    fn test_parse_seed_radix_detection() {
        assert_eq!(parse_seed("0").unwrap(), 0);
        assert_eq!(parse_seed("12345").unwrap(), 12345);
        assert_eq!(parse_seed("0xDEADbeef").unwrap(), 0xDEAD_BEEF);
        assert_eq!(parse_seed("0X10").unwrap(), 16);
        assert_eq!(parse_seed("017").unwrap(), 15);
        assert_eq!(parse_seed(" 7 ").unwrap(), 7);
        assert_eq!(parse_seed("18446744073709551615").unwrap(), u64::MAX);
    }

    #[test]
    fn test_parse_seed_rejects_garbage() {
        for bad in ["", "0x", "abc", "12abc", "09", "-1", "0x-1", "18446744073709551616"] {
            match parse_seed(bad) {
                Err(BenchError::InvalidSeed { input }) => assert_eq!(input, bad),
                other => panic!("{bad:?} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn test_presets_follow_width() {
        let config = BenchConfig::full();
        assert_eq!(config.width, Width::W32);
        assert_eq!(config.scale, WorkloadScale::full_32());

        let config = config.with_width(Width::W64);
        assert_eq!(config.scale, WorkloadScale::full_64());

        // Explicit scales are left alone.
        let config = BenchConfig::smoke().with_width(Width::W64);
        assert_eq!(config.scale, WorkloadScale::reduced());
    }

    #[test]
    fn test_validate_rejects_empty_workloads() {
        let config = BenchConfig::smoke().with_scale(WorkloadScale {
            shrinking_top: 0,
            ..WorkloadScale::reduced()
        });
        assert!(matches!(
            config.validate(),
            Err(BenchError::InvalidConfig { .. })
        ));
        assert!(BenchConfig::full().validate().is_ok());
        assert!(BenchConfig::full().with_width(Width::W64).validate().is_ok());
    }

    #[test]
    fn test_scale_preset_from_str() {
        assert_eq!("FULL".parse::<ScalePreset>().unwrap(), ScalePreset::Full);
        assert_eq!("quick".parse::<ScalePreset>().unwrap(), ScalePreset::Quick);
        assert!("huge".parse::<ScalePreset>().is_err());
    }

    #[test]
    fn test_width_lookup() {
        assert_eq!(Width::from_bits(64).unwrap(), Width::W64);
        assert_eq!(Width::W32.to_string(), "32-bit");
        assert!(matches!(
            Width::from_bits(128),
            Err(BenchError::UnsupportedWidth { bits: 128 })
        ));
    }

    #[test]
    fn test_fixed_seed_resolves_without_entropy() {
        assert_eq!(SeedPolicy::Fixed(9).resolve().unwrap(), 9);
        assert!(SeedPolicy::Entropy.resolve().is_ok());
    }
}
