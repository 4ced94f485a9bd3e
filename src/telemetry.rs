//! Structured telemetry for broken benchmark invariants.
//!
//! A strategy that returns a value outside `[0, range)` invalidates every
//! measurement taken after it, so the harness treats it as fatal. Before
//! aborting, it reports a [`SpecViolation`] through a [`ViolationObserver`] so
//! the failure is visible as structured data rather than only a panic message.
//! Without an observer the violation is logged through [`TracingObserver`];
//! tests attach a [`CollectingObserver`] instead.
//!
//! # Example
//!
//! ```
//! use bounded_rand::telemetry::CollectingObserver;
//! use bounded_rand::{Harness, Workload};
//! use bounded_rand::source::{Pcg32, SeedableSource};
//! use std::sync::Arc;
//!
//! let collector = Arc::new(CollectingObserver::new());
//! let harness = Harness::<u32>::from_workloads(vec![Workload::Constant { range: 7, count: 4 }])?
//!     .with_observer(collector.clone());
//! harness.run_with("mod", &mut Pcg32::seed_from_u64(1), &mut Vec::new(), |source, range| {
//!     bounded_rand::Algorithm::BiasedMod.sample(source, range)
//! })?;
//! assert!(collector.violations().is_empty());
//! # Ok::<(), bounded_rand::BenchError>(())
//! ```

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Severity of a violation.
///
/// Severities are ordered from least to most severe, allowing filtering
/// and comparison operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    /// Unexpected but recoverable; the run continued.
    Warning,
    /// The run stopped but nothing measured so far is suspect.
    Error,
    /// Measurements are invalid; the run aborts.
    Critical,
}

impl ViolationSeverity {
    /// Returns a string representation suitable for logging labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of violations.
///
/// # Forward Compatibility
///
/// This enum is marked `#[non_exhaustive]` because new violation categories
/// may be added in future versions. Always include a wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ViolationKind {
    /// A strategy returned a value outside `[0, range)`.
    Postcondition,
}

impl ViolationKind {
    /// Returns a string representation suitable for logging labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postcondition => "postcondition",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded violation.
///
/// # Serialization
///
/// This type implements `serde::Serialize` for structured JSON output.
/// The workload field is the 1-based test number, or `null` outside a run.
///
/// # Example
///
/// ```
/// use bounded_rand::telemetry::{SpecViolation, ViolationSeverity, ViolationKind};
///
/// let violation = SpecViolation::new(
///     ViolationSeverity::Critical,
///     ViolationKind::Postcondition,
///     "value out of range",
///     "harness.rs:42",
/// )
/// .with_workload(3)
/// .with_context("range", "7")
/// .with_context("value", "9");
///
/// assert_eq!(violation.workload, Some(3));
/// assert_eq!(violation.context.len(), 2);
/// ```
#[derive(Debug, Clone, serde::Serialize)]
pub struct SpecViolation {
    /// The severity level of this violation.
    pub severity: ViolationSeverity,
    /// The category of the violation.
    pub kind: ViolationKind,
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Source location where the violation was detected (file:line).
    pub location: &'static str,
    /// The 1-based workload ("Test N") being run, if any.
    pub workload: Option<usize>,
    /// Additional structured context as key-value pairs.
    pub context: BTreeMap<String, String>,
}

impl SpecViolation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        severity: ViolationSeverity,
        kind: ViolationKind,
        message: impl Into<String>,
        location: &'static str,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location,
            workload: None,
            context: BTreeMap::new(),
        }
    }

    /// Sets the workload during which this violation occurred.
    #[must_use]
    pub fn with_workload(mut self, workload: usize) -> Self {
        self.workload = Some(workload);
        self
    }

    /// Adds a context key-value pair.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for SpecViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {} (at {}",
            self.severity, self.kind, self.message, self.location
        )?;
        if let Some(workload) = self.workload {
            write!(f, ", test={workload}")?;
        }
        if !self.context.is_empty() {
            write!(f, ", context={:?}", self.context)?;
        }
        write!(f, ")")
    }
}

/// Trait for observing violations.
///
/// Observers are shared with the harness behind an `Arc`, so they must be
/// `Send + Sync`.
///
/// # Example
///
/// ```
/// use bounded_rand::telemetry::{ViolationObserver, SpecViolation};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct CountingObserver {
///     seen: AtomicUsize,
/// }
///
/// impl ViolationObserver for CountingObserver {
///     fn on_violation(&self, _violation: &SpecViolation) {
///         self.seen.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait ViolationObserver: Send + Sync {
    /// Called when a violation is detected.
    fn on_violation(&self, violation: &SpecViolation);
}

/// Built-in observer that logs violations via the `tracing` crate.
///
/// # Log Levels
///
/// - `Warning` severity → `tracing::warn!`
/// - `Error` and `Critical` severity → `tracing::error!`
///
/// Fields are emitted as structured tracing fields (`severity`, `kind`,
/// `location`, `workload`, `context`).
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a new tracing observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn format_workload(workload: Option<usize>) -> String {
        match workload {
            None => "null".to_owned(),
            Some(n) => n.to_string(),
        }
    }
}

impl ViolationObserver for TracingObserver {
    fn on_violation(&self, violation: &SpecViolation) {
        let severity = violation.severity.as_str();
        let kind = violation.kind.as_str();
        let location = violation.location;
        let workload = Self::format_workload(violation.workload);

        let context_str = if violation.context.is_empty() {
            "{}".to_owned()
        } else {
            let pairs: Vec<String> = violation
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        };

        match violation.severity {
            ViolationSeverity::Warning => {
                tracing::warn!(
                    severity,
                    kind,
                    location,
                    workload = %workload,
                    context = %context_str,
                    "{}",
                    violation.message
                );
            },
            ViolationSeverity::Error | ViolationSeverity::Critical => {
                tracing::error!(
                    severity,
                    kind,
                    location,
                    workload = %workload,
                    context = %context_str,
                    "{}",
                    violation.message
                );
            },
        }
    }
}

/// Built-in observer that collects violations for testing.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    violations: Mutex<Vec<SpecViolation>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer with an empty violation list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            violations: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of all collected violations.
    #[must_use]
    pub fn violations(&self) -> Vec<SpecViolation> {
        self.violations.lock().clone()
    }

    /// Checks if any violation of the given kind has been collected.
    #[must_use]
    pub fn has_violation(&self, kind: ViolationKind) -> bool {
        self.violations.lock().iter().any(|v| v.kind == kind)
    }
}

impl ViolationObserver for CollectingObserver {
    fn on_violation(&self, violation: &SpecViolation) {
        self.violations.lock().push(violation.clone());
    }
}

/// Reports a violation to an optional observer, falling back to [`TracingObserver`] if `None`.
pub fn report_to_observer<O: ViolationObserver + ?Sized>(
    observer: Option<&Arc<O>>,
    violation: &SpecViolation,
) {
    match observer {
        Some(obs) => obs.on_violation(violation),
        None => TracingObserver.on_violation(violation),
    }
}

/// Reports a violation raised during workload `N` through an optional
/// observer.
///
/// The first argument is an `Option<Arc<dyn ViolationObserver>>`; `None`
/// falls back to [`TracingObserver`]. The location is the call site.
///
/// ```text
/// report_violation_to!(observer, workload = n; severity, kind, "message {}", args);
/// ```
#[macro_export]
macro_rules! report_violation_to {
    ($observer:expr, workload = $workload:expr; $severity:expr, $kind:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let violation = $crate::telemetry::SpecViolation::new(
            $severity,
            $kind,
            format!($fmt $(, $($arg)+)?),
            concat!(file!(), ":", line!()),
        )
        .with_workload($workload);
        $crate::telemetry::report_to_observer($observer.as_ref(), &violation);
    }};
}

/// Asserts that no violations have been collected.
///
/// # Panics
///
/// Panics if the observer contains any violations, printing them for debugging.
#[macro_export]
macro_rules! assert_no_violations {
    ($observer:expr) => {{
        let violations = $observer.violations();
        assert!(
            violations.is_empty(),
            "Expected no violations, but found {}:\n{:#?}",
            violations.len(),
            violations
        );
    }};
}

/// Asserts that a violation of the specified kind was collected.
///
/// # Panics
///
/// Panics if no violation of the specified kind was found.
#[macro_export]
macro_rules! assert_violation {
    ($observer:expr, $kind:expr) => {{
        assert!(
            $observer.has_violation($kind),
            "Expected violation of kind {:?}, but found: {:#?}",
            $kind,
            $observer.violations()
        );
    }};
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
    fn test_violation_severity_ordering() {
        assert!(ViolationSeverity::Warning < ViolationSeverity::Error);
        assert!(ViolationSeverity::Error < ViolationSeverity::Critical);
    }

    #[test]
    fn test_spec_violation_display() {
        let violation = SpecViolation::new(
            ViolationSeverity::Critical,
            ViolationKind::Postcondition,
            "value out of range",
            "harness.rs:10",
        )
        .with_workload(2)
        .with_context("range", "7");

        let text = violation.to_string();
        assert!(text.starts_with("[critical/postcondition] value out of range"));
        assert!(text.contains("test=2"));
        assert!(text.contains("\"range\""));
    }

    #[test]
    fn test_report_violation_to_tags_workload() {
        let collector = Arc::new(CollectingObserver::new());
        let observer: Option<Arc<dyn ViolationObserver>> = Some(collector.clone());

        report_violation_to!(
            observer,
            workload = 4;
            ViolationSeverity::Critical,
            ViolationKind::Postcondition,
            "value {} not below {}",
            12,
            10
        );

        let violations = collector.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].workload, Some(4));
        assert_eq!(violations[0].message, "value 12 not below 10");
        assert_violation!(collector, ViolationKind::Postcondition);
    }

    #[test]
    fn test_missing_observer_logs_through_tracing() {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let observer: Option<Arc<dyn ViolationObserver>> = None;
        tracing::subscriber::with_default(subscriber, || {
            report_violation_to!(
                observer,
                workload = 3;
                ViolationSeverity::Critical,
                ViolationKind::Postcondition,
                "bitmask returned {} for range {}",
                9,
                7
            );
        });

        let text = String::from_utf8(sink.0.lock().clone()).unwrap();
        assert!(text.contains("ERROR"), "{text}");
        assert!(text.contains("bitmask returned 9 for range 7"), "{text}");
        assert!(text.contains("postcondition"), "{text}");
        assert!(text.contains("workload=3"), "{text}");
    }

    #[test]
    fn test_assert_no_violations_macro() {
        let observer = CollectingObserver::new();
        assert_no_violations!(observer);
    }

    #[test]
    fn test_tracing_observer_format_workload() {
        assert_eq!(TracingObserver::format_workload(None), "null");
        assert_eq!(TracingObserver::format_workload(Some(5)), "5");
    }

    #[test]
    fn test_spec_violation_serializes_snake_case() {
        let violation = SpecViolation::new(
            ViolationSeverity::Critical,
            ViolationKind::Postcondition,
            "out of range",
            "test.rs:1",
        )
        .with_workload(1);

        let parsed = serde_json::to_value(&violation).unwrap();
        assert_eq!(parsed["severity"], "critical");
        assert_eq!(parsed["kind"], "postcondition");
        assert_eq!(parsed["workload"], 1);
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
