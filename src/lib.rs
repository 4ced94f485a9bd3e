//! # bounded-rand
//!
//! Benchmarks for the many ways of turning a uniform stream of machine words
//! into a uniform integer in `[0, range)`.
//!
//! The crate is organised bottom-up:
//!
//! - [`word`]: the [`Word`] trait that lets every strategy run at 32 and 64 bits
//!   from one source text.
//! - [`source`]: the [`BitSource`](source::BitSource) trait and the PCG
//!   generators that feed the strategies.
//! - [`algorithms`]: the strategy catalog ([`Algorithm`]), from plain modulo to
//!   Lemire's multiply-and-reject with its threshold optimisations.
//! - [`workload`]: the range sequences a run sweeps through.
//! - [`harness`]: the timed loop with its postcondition check and checksums.
//! - [`config`]: run configuration, presets and seed parsing.
//!
//! # Quick start
//!
//! ```
//! use bounded_rand::{run_benchmark, Algorithm, BenchConfig, SeedPolicy};
//!
//! let config = BenchConfig::smoke()
//!     .with_algorithm(Algorithm::DebiasedModX2Topt)
//!     .with_seed(SeedPolicy::Fixed(0x1234));
//! let mut out = Vec::new();
//! let report = run_benchmark(&config, &mut out)?;
//! assert_eq!(report.workloads.len(), 3);
//! # Ok::<(), bounded_rand::BenchError>(())
//! ```
//!
//! Drawing a single bounded value works without the harness:
//!
//! ```
//! use bounded_rand::Algorithm;
//! use bounded_rand::source::{Pcg64, SeedableSource};
//!
//! let mut rng = Pcg64::seed_from_u64(7);
//! let die = Algorithm::DebiasedIntMultTopt.sample(&mut rng, 6u64) + 1;
//! assert!((1..=6).contains(&die));
//! ```

#![forbid(unsafe_code)] // let us try
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use algorithms::{Algorithm, Family, StrategyVisitor};
pub use config::{BenchConfig, ScalePreset, SeedPolicy, Width};
pub use error::BenchError;
pub use harness::{run_benchmark, Harness, RunReport, WorkloadReport};
pub use source::{BitSource, MeasureDistance, SeedableSource};
pub use timer::Timer;
pub use word::Word;
pub use workload::{Workload, WorkloadScale};

pub mod algorithms;
pub mod config;
#[doc(hidden)]
pub mod error;
pub mod harness;
pub mod source;
pub mod telemetry;
#[cfg(test)]
mod test_config;
pub mod timer;
pub mod word;
pub mod workload;
