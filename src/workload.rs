//! Range sequences that drive a benchmark run.
//!
//! Each [`Workload`] is a fixed shape of `range` values: a long shrinking
//! sweep, many short sweeps over small ranges, a sweep across every bit width,
//! or a constant range repeated. A [`WorkloadScale`] sizes the shapes, and
//! [`WorkloadScale::plan`] lays them out per word width in run order.
//!
//! No workload ever yields `range == 0`.

use crate::word::Word;
use crate::BenchError;
use std::fmt;

/// One shape of range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workload<W: Word> {
    /// `i` from `top` down to `1`, each widened with [`Word::spread_u32`].
    Shrinking {
        /// First (largest) value of `i`.
        top: u32,
    },
    /// `repeats` descending sweeps from `top` down to `1`.
    SmallRange {
        /// First range of each sweep.
        top: W,
        /// Number of sweeps.
        repeats: u32,
    },
    /// For each bit `b` and each `i` below `samples_per_bit`,
    /// `range = (1 << b) | (i & ((1 << b) - 1))`.
    Boundary {
        /// Ranges drawn per bit width.
        samples_per_bit: u32,
    },
    /// The same range `count` times.
    Constant {
        /// The range.
        range: W,
        /// Number of draws.
        count: u32,
    },
}

impl<W: Word> Workload<W> {
    /// Number of ranges this workload yields.
    #[must_use]
    pub fn len(&self) -> u64 {
        match *self {
            Self::Shrinking { top } => u64::from(top),
            Self::SmallRange { top, repeats } => top.as_u64().saturating_mul(u64::from(repeats)),
            Self::Boundary { samples_per_bit } => u64::from(W::BITS) * u64::from(samples_per_bit),
            Self::Constant { count, .. } => u64::from(count),
        }
    }

    /// Returns true if the workload yields no ranges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects workloads that are empty or would yield `range == 0`.
    pub fn validate(&self) -> Result<(), BenchError> {
        match *self {
            Self::Constant { range, .. } if range == W::ZERO => Err(BenchError::InvalidConfig {
                info: format!("{self}: range must be non-zero"),
            }),
            _ if self.is_empty() => Err(BenchError::InvalidConfig {
                info: format!("{self}: workload is empty"),
            }),
            _ => Ok(()),
        }
    }

    /// Iterates the ranges in order.
    pub fn ranges(&self) -> Ranges<W> {
        let cursor = match *self {
            Self::Shrinking { top } => Cursor::Shrinking { next: top },
            Self::SmallRange { top, repeats } => Cursor::SmallRange {
                top,
                next: top,
                repeats_left: if top == W::ZERO { 0 } else { repeats },
            },
            Self::Boundary { samples_per_bit } => Cursor::Boundary {
                bit: if samples_per_bit == 0 { W::BITS } else { 0 },
                index: 0,
                samples_per_bit,
            },
            Self::Constant { range, count } => Cursor::Constant {
                range,
                left: if range == W::ZERO { 0 } else { count },
            },
        };
        Ranges { cursor }
    }

    /// Calls `f` with every range in order.
    ///
    /// Same sequence as [`ranges`](Self::ranges), written as plain nested
    /// loops so the caller's body is the only thing in the hot path.
    #[inline]
    pub fn for_each_range<F: FnMut(W)>(&self, mut f: F) {
        match *self {
            Self::Shrinking { top } => {
                for i in (1..=top).rev() {
                    f(W::spread_u32(i));
                }
            }
            Self::SmallRange { top, repeats } => {
                if top == W::ZERO {
                    return;
                }
                for _ in 0..repeats {
                    let mut range = top;
                    while range != W::ZERO {
                        f(range);
                        range = range - W::ONE;
                    }
                }
            }
            Self::Boundary { samples_per_bit } => {
                for bit in 0..W::BITS {
                    let low = W::ONE << bit;
                    let fill = low - W::ONE;
                    for i in 0..samples_per_bit {
                        f(low | (W::from_u32(i) & fill));
                    }
                }
            }
            Self::Constant { range, count } => {
                if range == W::ZERO {
                    return;
                }
                for _ in 0..count {
                    f(range);
                }
            }
        }
    }
}

impl<W: Word> fmt::Display for Workload<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shrinking { top } => write!(f, "shrinking sweep from {top:#x}"),
            Self::SmallRange { top, repeats } => {
                write!(f, "{repeats} small-range sweeps from {:#x}", top.as_u64())
            }
            Self::Boundary { samples_per_bit } => {
                write!(f, "boundary sweep, {samples_per_bit:#x} per bit")
            }
            Self::Constant { range, count } => {
                write!(f, "constant range {range} x {count:#x}")
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Cursor<W> {
    Shrinking {
        next: u32,
    },
    SmallRange {
        top: W,
        next: W,
        repeats_left: u32,
    },
    Boundary {
        bit: u32,
        index: u32,
        samples_per_bit: u32,
    },
    Constant {
        range: W,
        left: u32,
    },
}

/// Iterator over a workload's ranges, from [`Workload::ranges`].
#[derive(Debug, Clone)]
pub struct Ranges<W> {
    cursor: Cursor<W>,
}

impl<W: Word> Iterator for Ranges<W> {
    type Item = W;

    fn next(&mut self) -> Option<W> {
        match &mut self.cursor {
            Cursor::Shrinking { next } => {
                if *next == 0 {
                    return None;
                }
                let range = W::spread_u32(*next);
                *next -= 1;
                Some(range)
            }
            Cursor::SmallRange {
                top,
                next,
                repeats_left,
            } => {
                if *repeats_left == 0 {
                    return None;
                }
                let range = *next;
                if range == W::ONE {
                    *repeats_left -= 1;
                    *next = *top;
                } else {
                    *next = range - W::ONE;
                }
                Some(range)
            }
            Cursor::Boundary {
                bit,
                index,
                samples_per_bit,
            } => {
                if *bit >= W::BITS {
                    return None;
                }
                let low = W::ONE << *bit;
                let range = low | (W::from_u32(*index) & (low - W::ONE));
                *index += 1;
                if *index == *samples_per_bit {
                    *index = 0;
                    *bit += 1;
                }
                Some(range)
            }
            Cursor::Constant { range, left } => {
                if *left == 0 {
                    return None;
                }
                *left -= 1;
                Some(*range)
            }
        }
    }
}

/// Sizes of the workload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct WorkloadScale {
    /// Start of the shrinking sweep.
    pub shrinking_top: u32,
    /// Start of each small-range sweep.
    pub small_top: u64,
    /// Number of small-range sweeps.
    pub small_repeats: u32,
    /// Boundary-sweep ranges per bit width.
    pub samples_per_bit: u32,
    /// Draws per constant-range workload; only the 64-bit plan has them.
    pub constant_count: u32,
}

impl WorkloadScale {
    /// Full-size 32-bit benchmark (three workloads).
    #[must_use]
    pub const fn full_32() -> Self {
        Self {
            shrinking_top: 0xFFFF_FFFF,
            small_top: 0xFFFF,
            small_repeats: 0xFFFF,
            samples_per_bit: 0x100_0000,
            constant_count: 0,
        }
    }

    /// Full-size 64-bit benchmark (five workloads).
    #[must_use]
    pub const fn full_64() -> Self {
        Self {
            shrinking_top: 0xFFFF_FFFF,
            small_top: 0xFFFF_FFFF,
            small_repeats: 1,
            samples_per_bit: 0x80_0000,
            constant_count: 0x8000_0000,
        }
    }

    /// Same shapes at roughly a sixteenth of the full work.
    #[must_use]
    pub const fn quick() -> Self {
        Self {
            shrinking_top: 0x0FFF_FFFF,
            small_top: 0xFFFF,
            small_repeats: 0x1000,
            samples_per_bit: 0x10_0000,
            constant_count: 0x800_0000,
        }
    }

    /// Small enough for unit tests.
    #[must_use]
    pub const fn reduced() -> Self {
        Self {
            shrinking_top: 0xFFFF,
            small_top: 0xFF,
            small_repeats: 0xFF,
            samples_per_bit: 0x100,
            constant_count: 0x1_0000,
        }
    }

    /// The full-size scale for a word width.
    pub fn full_for_width(bits: u32) -> Result<Self, BenchError> {
        match bits {
            32 => Ok(Self::full_32()),
            64 => Ok(Self::full_64()),
            _ => Err(BenchError::UnsupportedWidth { bits }),
        }
    }

    /// Lays out the run for word type `W`, validating every workload.
    ///
    /// Both widths run the shrinking, small-range and boundary sweeps; the
    /// 64-bit plan adds constant ranges `52` and `2^64 - 52`.
    pub fn plan<W: Word>(&self) -> Result<Vec<Workload<W>>, BenchError> {
        let small_top = W::from_u64_truncating(self.small_top);
        if small_top.as_u64() != self.small_top {
            return Err(BenchError::InvalidConfig {
                info: format!(
                    "small-range top {:#x} does not fit in {} bits",
                    self.small_top,
                    W::BITS
                ),
            });
        }

        let mut plan = vec![
            Workload::Shrinking {
                top: self.shrinking_top,
            },
            Workload::SmallRange {
                top: small_top,
                repeats: self.small_repeats,
            },
            Workload::Boundary {
                samples_per_bit: self.samples_per_bit,
            },
        ];
        if W::BITS == 64 {
            let small_constant = W::from_u32(52);
            plan.push(Workload::Constant {
                range: small_constant,
                count: self.constant_count,
            });
            plan.push(Workload::Constant {
                range: small_constant.wrapping_neg(),
                count: self.constant_count,
            });
        }

        for workload in &plan {
            workload.validate()?;
        }
        Ok(plan)
    }
}

impl Default for WorkloadScale {
    fn default() -> Self {
        Self::reduced()
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
    use crate::test_config::miri_case_count;
    use proptest::prelude::*;

    fn collect<W: Word>(workload: Workload<W>) -> Vec<W> {
        let mut via_callback = Vec::new();
        workload.for_each_range(|range| via_callback.push(range));
        let via_iterator: Vec<W> = workload.ranges().collect();
        assert_eq!(via_callback, via_iterator, "{workload}");
        assert_eq!(via_iterator.len() as u64, workload.len(), "{workload}");
        via_iterator
    }

    #[test]
    fn test_shrinking_sweep() {
        assert_eq!(collect(Workload::<u32>::Shrinking { top: 4 }), vec![4, 3, 2, 1]);
        assert_eq!(
            collect(Workload::<u64>::Shrinking { top: 2 }),
            vec![0x2_0000_0002, 0x1_0000_0001]
        );
    }

    #[test]
    fn test_small_range_sweeps_repeat() {
        assert_eq!(
            collect(Workload::<u32>::SmallRange { top: 3, repeats: 2 }),
            vec![3, 2, 1, 3, 2, 1]
        );
    }

    #[test]
    fn test_boundary_sweep_covers_each_width() {
        let ranges = collect(Workload::<u32>::Boundary { samples_per_bit: 3 });
        assert_eq!(ranges.len(), 96);
        // bit 0: only 1; bit 1: 2,3,2; bit 2: 4,5,6
        assert_eq!(&ranges[..9], &[1, 1, 1, 2, 3, 2, 4, 5, 6]);
        for (position, range) in ranges.iter().enumerate() {
            let bit = (position / 3) as u32;
            assert_eq!(31 - range.leading_zeros(), bit);
        }

        let wide = collect(Workload::<u64>::Boundary { samples_per_bit: 2 });
        assert_eq!(wide.len(), 128);
        assert_eq!(wide[126..], [1 << 63, (1 << 63) | 1]);
    }

    #[test]
    fn test_constant_repeats_range() {
        assert_eq!(
            collect(Workload::<u64>::Constant { range: 52, count: 3 }),
            vec![52, 52, 52]
        );
    }

    #[test]
    fn test_plans_per_width() {
        let narrow = WorkloadScale::full_32().plan::<u32>().unwrap();
        assert_eq!(narrow.len(), 3);
        assert_eq!(narrow[0].len(), 0xFFFF_FFFF);
        assert_eq!(narrow[1].len(), 0xFFFF * 0xFFFF);
        assert_eq!(narrow[2].len(), 32 * 0x100_0000);

        let wide = WorkloadScale::full_64().plan::<u64>().unwrap();
        assert_eq!(wide.len(), 5);
        assert_eq!(
            wide[3],
            Workload::Constant {
                range: 52,
                count: 0x8000_0000
            }
        );
        assert_eq!(
            wide[4],
            Workload::Constant {
                range: u64::MAX - 51,
                count: 0x8000_0000
            }
        );
        assert_eq!(wide[2].len(), 64 * 0x80_0000);
    }

    #[test]
    fn test_plan_rejects_oversized_small_top() {
        let scale = WorkloadScale {
            small_top: 1 << 32,
            ..WorkloadScale::reduced()
        };
        assert!(matches!(
            scale.plan::<u32>(),
            Err(BenchError::InvalidConfig { .. })
        ));
        assert!(scale.plan::<u64>().is_ok());
    }

    #[test]
    fn test_plan_rejects_empty_workloads() {
        let scale = WorkloadScale {
            samples_per_bit: 0,
            ..WorkloadScale::reduced()
        };
        let err = scale.plan::<u64>().unwrap_err();
        assert!(err.to_string().contains("boundary sweep"), "{err}");

        let scale = WorkloadScale {
            constant_count: 0,
            ..WorkloadScale::reduced()
        };
        // 32-bit plans have no constant workloads.
        assert!(scale.plan::<u32>().is_ok());
        assert!(scale.plan::<u64>().is_err());
    }

    #[test]
    fn test_zero_range_workloads_yield_nothing() {
        let workload = Workload::<u32>::Constant { range: 0, count: 5 };
        assert!(workload.validate().is_err());
        assert_eq!(workload.ranges().count(), 0);
        let mut calls = 0;
        workload.for_each_range(|_| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_width_lookup() {
        assert_eq!(WorkloadScale::full_for_width(64).unwrap(), WorkloadScale::full_64());
        assert!(matches!(
            WorkloadScale::full_for_width(16),
            Err(BenchError::UnsupportedWidth { bits: 16 })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: miri_case_count(),
            ..ProptestConfig::default()
        })]

        /// Property: no reduced-scale shape ever yields a zero range, and the
        /// iterator and callback forms agree.
        #[test]
        fn prop_workloads_never_yield_zero(
            top in 1u32..300,
            small_top in 1u64..64,
            repeats in 1u32..8,
            samples in 1u32..16,
        ) {
            let scale = WorkloadScale {
                shrinking_top: top,
                small_top,
                small_repeats: repeats,
                samples_per_bit: samples,
                constant_count: 4,
            };
            for workload in scale.plan::<u64>().unwrap() {
                let ranges = collect(workload);
                prop_assert!(ranges.iter().all(|&range| range != 0));
            }
        }
    }
}
