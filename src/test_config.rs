//! Shared sizing for the crate's unit and property tests.
//!
//! Under Miri every draw is interpreted, so loops that run fast natively
//! (thousands of rejection-sampled draws, hundreds of proptest cases) are cut
//! down to a handful.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_config::{miri_case_count, miri_sample_count};
//!
//! proptest! {
//!     #![proptest_config(ProptestConfig {
//!         cases: miri_case_count(),
//!         ..ProptestConfig::default()
//!     })]
//!     #[test]
//!     fn prop_in_range(word in any::<u32>()) {
//!         // ...
//!     }
//! }
//!
//! for _ in 0..miri_sample_count(10_000) {
//!     // ...
//! }
//! ```

/// Proptest cases per property: 256 natively, 5 under Miri.
#[must_use]
pub const fn miri_case_count() -> u32 {
    if cfg!(miri) {
        5
    } else {
        256
    }
}

/// Draws per sampling loop: `full` natively, a hundredth of it (at least one)
/// under Miri.
#[must_use]
pub const fn miri_sample_count(full: usize) -> usize {
    if cfg!(miri) {
        let reduced = full / 100;
        if reduced == 0 {
            1
        } else {
            reduced
        }
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_miri() {
        if cfg!(miri) {
            assert_eq!(miri_case_count(), 5);
            assert_eq!(miri_sample_count(10_000), 100);
            assert_eq!(miri_sample_count(50), 1);
        } else {
            assert_eq!(miri_case_count(), 256);
            assert_eq!(miri_sample_count(10_000), 10_000);
        }
    }
}
