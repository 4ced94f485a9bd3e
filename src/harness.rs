//! Benchmark harness: drives one strategy through every workload of a plan.
//!
//! For each workload the harness times a tight loop that calls the strategy
//! once per range, checks `value < range` on every call and sums the values
//! into a checksum. The report goes to an [`io::Write`](std::io::Write) sink:
//!
//! ```text
//! Test 1 started...
//! Test 1 completed (0.000512 seconds)
//! Sum1 = 1073709056
//! ...
//! 1311 numbers used
//! ```
//!
//! The last line is written only by [`Harness::run_measured`], for sources
//! that implement [`MeasureDistance`].
//!
//! A value outside `[0, range)` is a defect in the strategy, not a runtime
//! condition. It is reported to the configured [`ViolationObserver`] as a
//! critical [`ViolationKind::Postcondition`] and then the harness panics.
//!
//! # Example
//!
//! ```
//! use bounded_rand::{Algorithm, Harness, WorkloadScale};
//! use bounded_rand::source::{Pcg32, SeedableSource};
//!
//! let harness = Harness::<u32>::new(&WorkloadScale::reduced())?;
//! let mut source = Pcg32::seed_from_u64(42);
//! let mut out = Vec::new();
//! let report = harness.run_measured(Algorithm::Bitmask, &mut source, &mut out)?;
//! assert_eq!(report.workloads.len(), 3);
//! assert!(report.draws_per_sample().unwrap_or(0.0) >= 1.0);
//! # Ok::<(), bounded_rand::BenchError>(())
//! ```

use crate::algorithms::{Algorithm, StrategyVisitor};
use crate::config::{BenchConfig, Width};
use crate::source::{BitSource, MeasureDistance, Pcg32, Pcg64, SeedableSource};
use crate::telemetry::{ViolationKind, ViolationObserver, ViolationSeverity};
use crate::timer::Timer;
use crate::word::Word;
use crate::workload::{Workload, WorkloadScale};
use crate::{report_violation_to, BenchError};
use serde::Serializer;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one workload.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WorkloadReport {
    /// 1-based test number, as printed.
    pub number: usize,
    /// Human-readable shape, e.g. `"shrinking sweep from 0xffff"`.
    pub workload: String,
    /// Ranges drawn in this workload.
    pub samples: u64,
    /// Wall time of the loop.
    pub elapsed_secs: f64,
    /// Sum of every value drawn.
    #[serde(serialize_with = "decimal")]
    pub checksum: u128,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RunReport {
    /// Strategy name, or the label given to [`Harness::run_with`].
    pub label: String,
    /// Word width in bits.
    pub width: u32,
    /// Seed of the bit source, when the run was started from a config.
    pub seed: Option<u64>,
    /// Per-workload results in run order.
    pub workloads: Vec<WorkloadReport>,
    /// Words drawn across the run, when the source can measure it.
    #[serde(serialize_with = "optional_decimal")]
    pub words_used: Option<u128>,
}

impl RunReport {
    /// Ranges drawn across every workload.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.workloads.iter().map(|workload| workload.samples).sum()
    }

    /// Average words drawn per output. `1.0` means no rejections.
    #[must_use]
    pub fn draws_per_sample(&self) -> Option<f64> {
        let samples = self.samples();
        match self.words_used {
            Some(used) if samples > 0 => Some(used as f64 / samples as f64),
            _ => None,
        }
    }

    /// Total wall time across workloads.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.workloads.iter().map(|workload| workload.elapsed_secs).sum()
    }

    /// Pretty-printed JSON, with checksums as decimal strings.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, BenchError> {
        serde_json::to_string_pretty(self).map_err(|err| BenchError::Report {
            context: err.to_string(),
        })
    }
}

fn decimal<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn optional_decimal<S: Serializer>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

/// Runs strategies over a fixed, validated plan of workloads.
#[derive(Clone)]
pub struct Harness<W: Word> {
    workloads: Vec<Workload<W>>,
    observer: Option<Arc<dyn ViolationObserver>>,
}

impl<W: Word> std::fmt::Debug for Harness<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("workloads", &self.workloads)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl<W: Word> Harness<W> {
    /// Builds the plan for word type `W` at `scale`.
    pub fn new(scale: &WorkloadScale) -> Result<Self, BenchError> {
        Ok(Self {
            workloads: scale.plan::<W>()?,
            observer: None,
        })
    }

    /// Uses an explicit list of workloads, validating each.
    pub fn from_workloads(workloads: Vec<Workload<W>>) -> Result<Self, BenchError> {
        if workloads.is_empty() {
            return Err(BenchError::InvalidConfig {
                info: "a run needs at least one workload".to_owned(),
            });
        }
        for workload in &workloads {
            workload.validate()?;
        }
        Ok(Self {
            workloads,
            observer: None,
        })
    }

    /// Sends postcondition violations to `observer` instead of the
    /// default tracing observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The workloads in run order.
    #[must_use]
    pub fn workloads(&self) -> &[Workload<W>] {
        &self.workloads
    }

    /// Runs `algorithm` over every workload.
    ///
    /// The strategy is resolved once; the loop is compiled per strategy.
    pub fn run<S, O>(
        &self,
        algorithm: Algorithm,
        source: &mut S,
        out: &mut O,
    ) -> Result<RunReport, BenchError>
    where
        S: BitSource<Word = W>,
        O: Write + ?Sized,
    {
        algorithm.visit::<S, _>(RunVisitor {
            harness: self,
            source,
            out,
        })
    }

    /// [`run`](Self::run), then writes `"<N> numbers used"` with the words
    /// drawn since the run started.
    pub fn run_measured<S, O>(
        &self,
        algorithm: Algorithm,
        source: &mut S,
        out: &mut O,
    ) -> Result<RunReport, BenchError>
    where
        S: BitSource<Word = W> + MeasureDistance + Clone,
        O: Write + ?Sized,
    {
        let checkpoint = source.clone();
        let mut report = self.run(algorithm, source, out)?;
        let used = source.words_consumed_since(&checkpoint);
        writeln!(out, "{used} numbers used")?;
        debug!(words_used = %used, samples = report.samples(), "distance measured");
        report.words_used = Some(used);
        Ok(report)
    }

    /// Runs an arbitrary sampler over every workload.
    ///
    /// `sampler` gets the same treatment as a catalog strategy, so custom
    /// reductions can be compared against the catalog.
    pub fn run_with<S, F, O>(
        &self,
        label: &str,
        source: &mut S,
        out: &mut O,
        sampler: F,
    ) -> Result<RunReport, BenchError>
    where
        S: BitSource<Word = W>,
        F: Fn(&mut S, W) -> W,
        O: Write + ?Sized,
    {
        debug!(label, width = W::BITS, workloads = self.workloads.len(), "run started");
        let mut workloads = Vec::with_capacity(self.workloads.len());
        for (index, workload) in self.workloads.iter().enumerate() {
            let number = index + 1;
            info!(workload = number, label, shape = %workload, "workload started");

            let timer = Timer::start(format!("Test {number}"), out)?;
            let mut checksum = W::Accumulator::default();
            workload.for_each_range(|range| {
                let value = sampler(&mut *source, range);
                if value >= range {
                    postcondition_failed(self.observer.as_ref(), number, label, range, value);
                }
                checksum += W::Accumulator::from(value);
            });
            let elapsed = timer.done(out)?;
            writeln!(out, "Sum{number} = {checksum}")?;

            let elapsed_secs = elapsed.as_secs_f64();
            info!(workload = number, label, elapsed_secs, checksum = %checksum, "workload finished");
            workloads.push(WorkloadReport {
                number,
                workload: workload.to_string(),
                samples: workload.len(),
                elapsed_secs,
                checksum: checksum.into(),
            });
        }
        out.flush()?;
        Ok(RunReport {
            label: label.to_owned(),
            width: W::BITS,
            seed: None,
            workloads,
            words_used: None,
        })
    }
}

#[cold]
#[inline(never)]
#[allow(clippy::panic)]
fn postcondition_failed<W: Word>(
    observer: Option<&Arc<dyn ViolationObserver>>,
    number: usize,
    label: &str,
    range: W,
    value: W,
) -> ! {
    let observer = observer.cloned();
    report_violation_to!(
        observer,
        workload = number;
        ViolationSeverity::Critical,
        ViolationKind::Postcondition,
        "{label} returned {value} for range {range}"
    );
    panic!("Test {number}: {label} returned {value}, not below range {range}");
}

struct RunVisitor<'a, W: Word, S, O: ?Sized> {
    harness: &'a Harness<W>,
    source: &'a mut S,
    out: &'a mut O,
}

impl<W, S, O> StrategyVisitor<S> for RunVisitor<'_, W, S, O>
where
    W: Word,
    S: BitSource<Word = W>,
    O: Write + ?Sized,
{
    type Output = Result<RunReport, BenchError>;

    fn visit<F>(self, algorithm: Algorithm, strategy: F) -> Self::Output
    where
        F: Fn(&mut S, S::Word) -> S::Word,
    {
        self.harness
            .run_with(algorithm.name(), self.source, self.out, strategy)
    }
}

/// Runs the benchmark described by `config`, writing the report to `out`.
///
/// Seeds a [`Pcg32`] or [`Pcg64`] according to the width and measures the
/// words drawn.
pub fn run_benchmark<O: Write + ?Sized>(
    config: &BenchConfig,
    out: &mut O,
) -> Result<RunReport, BenchError> {
    let seed = config.seed.resolve()?;
    debug!(algorithm = %config.algorithm, width = %config.width, seed, "benchmark configured");
    let mut report = match config.width {
        Width::W32 => {
            let harness = Harness::<u32>::new(&config.scale)?;
            harness.run_measured(config.algorithm, &mut Pcg32::seed_from_u64(seed), out)?
        }
        Width::W64 => {
            let harness = Harness::<u64>::new(&config.scale)?;
            harness.run_measured(config.algorithm, &mut Pcg64::seed_from_u64(seed), out)?
        }
    };
    report.seed = Some(seed);
    Ok(report)
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
    use crate::config::SeedPolicy;
    use crate::source::{CountingSource, ReplaySource};
    use crate::assert_violation;
    use crate::telemetry::CollectingObserver;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn tiny_scale() -> WorkloadScale {
        WorkloadScale {
            shrinking_top: 100,
            small_top: 10,
            small_repeats: 3,
            samples_per_bit: 4,
            constant_count: 50,
        }
    }

    fn output(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_report_lines_per_workload() {
        let harness = Harness::<u32>::new(&tiny_scale()).unwrap();
        let mut source = Pcg32::seed_from_u64(1);
        let mut out = Vec::new();
        let report = harness
            .run(Algorithm::DebiasedModX2, &mut source, &mut out)
            .unwrap();

        let lines = output(out);
        assert_eq!(lines.len(), 9);
        for number in 1..=3 {
            let base = (number - 1) * 3;
            assert_eq!(lines[base], format!("Test {number} started..."));
            assert!(lines[base + 1].starts_with(&format!("Test {number} completed (")));
            assert_eq!(
                lines[base + 2],
                format!("Sum{number} = {}", report.workloads[number - 1].checksum)
            );
        }
        assert_eq!(report.label, "debiased-mod-x2");
        assert_eq!(report.width, 32);
        assert_eq!(report.words_used, None);
    }

    #[test]
    fn test_sixty_four_bit_plan_has_five_tests() {
        let harness = Harness::<u64>::new(&tiny_scale()).unwrap();
        let mut source = Pcg64::seed_from_u64(1);
        let mut out = Vec::new();
        let report = harness
            .run_measured(Algorithm::DebiasedIntMultToptMoptBopt, &mut source, &mut out)
            .unwrap();
        assert_eq!(report.workloads.len(), 5);

        let lines = output(out);
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[12], "Test 5 started...");
        assert!(lines[14].starts_with("Sum5 = "));
        assert_eq!(lines.last().unwrap(), &format!("{} numbers used", report.words_used.unwrap()));
    }

    #[test]
    fn test_checksum_of_constant_sampler() {
        // A sampler that always returns range - 1 sums a known series.
        let harness = Harness::<u32>::from_workloads(vec![Workload::Shrinking { top: 10 }]).unwrap();
        let mut source = ReplaySource::new(vec![0u32]);
        let report = harness
            .run_with("top", &mut source, &mut Vec::new(), |_, range| range - 1)
            .unwrap();
        assert_eq!(report.workloads[0].checksum, (0..10).sum::<u128>());
        assert_eq!(report.samples(), 10);
    }

    #[test]
    fn test_measured_words_match_counting_source() {
        let harness = Harness::<u32>::new(&tiny_scale()).unwrap();
        let mut measured = Pcg32::seed_from_u64(3);
        let report = harness
            .run_measured(Algorithm::Bitmask, &mut measured, &mut Vec::new())
            .unwrap();

        let mut counted = CountingSource::new(Pcg32::seed_from_u64(3));
        let again = harness
            .run(Algorithm::Bitmask, &mut counted, &mut Vec::new())
            .unwrap();
        assert_eq!(report.words_used, Some(counted.drawn()));
        assert_eq!(report.workloads[0].checksum, again.workloads[0].checksum);
        assert!(report.draws_per_sample().unwrap() >= 1.0);
    }

    #[test]
    fn test_single_draw_strategies_use_one_word_per_sample() {
        let harness = Harness::<u64>::new(&tiny_scale()).unwrap();
        for algorithm in Algorithm::ALL.iter().filter(|a| a.draws_single_word()) {
            let mut source = Pcg64::seed_from_u64(9);
            let report = harness
                .run_measured(*algorithm, &mut source, &mut Vec::new())
                .unwrap();
            assert_eq!(report.words_used, Some(u128::from(report.samples())), "{algorithm}");
            assert_eq!(report.draws_per_sample(), Some(1.0));
        }
    }

    #[test]
    fn test_postcondition_failure_is_reported_then_panics() {
        let collector = Arc::new(CollectingObserver::new());
        let harness = Harness::<u32>::from_workloads(vec![Workload::Constant { range: 7, count: 3 }])
            .unwrap()
            .with_observer(collector.clone());
        let mut source = ReplaySource::new(vec![0u32]);

        let result = catch_unwind(AssertUnwindSafe(|| {
            harness.run_with("broken", &mut source, &mut Vec::new(), |_, range| range)
        }));
        assert!(result.is_err());

        let violations = collector.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, ViolationSeverity::Critical);
        assert_eq!(violations[0].workload, Some(1));
        assert_violation!(collector, ViolationKind::Postcondition);
        assert!(violations[0].message.contains("broken returned 7 for range 7"));
    }

    #[test]
    fn test_from_workloads_rejects_empty_plans() {
        assert!(Harness::<u32>::from_workloads(Vec::new()).is_err());
        assert!(Harness::<u32>::from_workloads(vec![Workload::Shrinking { top: 0 }]).is_err());
    }

    #[test]
    fn test_run_benchmark_is_deterministic_for_fixed_seed() {
        let config = BenchConfig::smoke()
            .with_scale(tiny_scale())
            .with_algorithm(Algorithm::DebiasedDiv)
            .with_seed(SeedPolicy::Fixed(0x5eed));
        let mut first = Vec::new();
        let mut second = Vec::new();
        let a = run_benchmark(&config, &mut first).unwrap();
        let b = run_benchmark(&config, &mut second).unwrap();
        assert_eq!(a.seed, Some(0x5eed));
        assert_eq!(
            a.workloads.iter().map(|w| w.checksum).collect::<Vec<_>>(),
            b.workloads.iter().map(|w| w.checksum).collect::<Vec<_>>()
        );
        assert_eq!(a.words_used, b.words_used);

        let sums = |bytes: Vec<u8>| -> Vec<String> {
            output(bytes)
                .into_iter()
                .filter(|line| line.starts_with("Sum") || line.ends_with("numbers used"))
                .collect()
        };
        assert_eq!(sums(first), sums(second));
    }

    #[test]
    fn test_report_serializes_checksums_as_strings() {
        let report = RunReport {
            label: "bitmask".to_owned(),
            width: 64,
            seed: Some(1),
            workloads: vec![WorkloadReport {
                number: 1,
                workload: "constant range 52 x 0x2".to_owned(),
                samples: 2,
                elapsed_secs: 0.5,
                checksum: u128::MAX,
            }],
            words_used: Some(3),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["workloads"][0]["checksum"], u128::MAX.to_string());
        assert_eq!(json["words_used"], "3");
        assert_eq!(report.draws_per_sample(), Some(1.5));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_to_json_is_pretty_printed() {
        let config = BenchConfig::smoke()
            .with_scale(tiny_scale())
            .with_seed(SeedPolicy::Fixed(8));
        let report = run_benchmark(&config, &mut Vec::new()).unwrap();
        let text = report.to_json().unwrap();
        assert!(text.contains("\n  \"label\": \"debiased-int-mult-topt\""), "{text}");
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["workloads"].as_array().unwrap().len(), 3);
    }
}
