//! Wall-clock timing for named benchmark phases.
//!
//! ```
//! use bounded_rand::Timer;
//!
//! let mut out = Vec::new();
//! let timer = Timer::start("Test 1", &mut out)?;
//! let elapsed = timer.done(&mut out)?;
//! let text = String::from_utf8(out).unwrap_or_default();
//! assert!(text.starts_with("Test 1 started...\nTest 1 completed ("));
//! assert!(elapsed.as_secs() < 60);
//! # Ok::<(), bounded_rand::BenchError>(())
//! ```

use crate::BenchError;
use std::io::Write;
use web_time::{Duration, Instant};

/// A started measurement. Consumed by [`Timer::done`].
#[derive(Debug)]
pub struct Timer {
    what: String,
    started: Instant,
}

impl Timer {
    /// Writes `"<what> started..."` and starts the clock.
    ///
    /// The clock starts after the line is written.
    pub fn start<O: Write + ?Sized>(what: impl Into<String>, out: &mut O) -> Result<Self, BenchError> {
        let what = what.into();
        writeln!(out, "{what} started...")?;
        out.flush()?;
        Ok(Self {
            what,
            started: Instant::now(),
        })
    }

    /// The label given to [`start`](Self::start).
    #[must_use]
    pub fn what(&self) -> &str {
        &self.what
    }

    /// Time since the clock started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the clock, writes `"<what> completed (<secs> seconds)"` and
    /// returns the elapsed time.
    pub fn done<O: Write + ?Sized>(self, out: &mut O) -> Result<Duration, BenchError> {
        let elapsed = self.started.elapsed();
        writeln!(
            out,
            "{} completed ({} seconds)",
            self.what,
            format_seconds(elapsed.as_secs_f64())
        )?;
        Ok(elapsed)
    }
}

/// Formats with six significant digits, trailing zeros trimmed, switching
/// to scientific notation outside `[1e-4, 1e6)`.
///
/// The notation is picked from the exponent after rounding, so `999999.7`
/// prints as `1e+06`.
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    const SIGNIFICANT: usize = 6;
    if seconds == 0.0 || !seconds.is_finite() {
        return format!("{seconds}");
    }
    let rounded = format!("{:.*e}", SIGNIFICANT - 1, seconds);
    let (mantissa, exponent) = rounded.split_once('e').unwrap_or((rounded.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -4 || exponent >= SIGNIFICANT as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs());
    }
    let decimals = (SIGNIFICANT as i32 - 1 - exponent).max(0) as usize;
    trim_fraction(&format!("{seconds:.decimals$}")).to_owned()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
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
    fn test_format_seconds_six_significant_digits() {
        assert_eq!(format_seconds(12.345678), "12.3457");
        assert_eq!(format_seconds(1.5), "1.5");
        assert_eq!(format_seconds(0.25), "0.25");
        assert_eq!(format_seconds(123456.7), "123457");
        assert_eq!(format_seconds(0.000123456), "0.000123456");
        assert_eq!(format_seconds(0.0), "0");
    }

    #[test]
    fn test_format_seconds_scientific() {
        assert_eq!(format_seconds(0.0000123456), "1.23456e-05");
        assert_eq!(format_seconds(1234567.0), "1.23457e+06");
        assert_eq!(format_seconds(0.00005), "5e-05");
    }

    #[test]
    fn test_format_seconds_rounding_crosses_a_decade() {
        assert_eq!(format_seconds(999999.7), "1e+06");
        assert_eq!(format_seconds(0.0000999999995), "0.0001");
        assert_eq!(format_seconds(9.999996), "10");
        assert_eq!(format_seconds(99999.96), "100000");
    }

    #[test]
    fn test_timer_writes_both_lines() {
        let mut out = Vec::new();
        let timer = Timer::start("Test 7", &mut out).unwrap();
        assert_eq!(timer.what(), "Test 7");
        let elapsed = timer.done(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Test 7 started...");
        assert!(lines[1].starts_with("Test 7 completed ("));
        assert!(lines[1].ends_with(" seconds)"));
        assert!(elapsed < Duration::from_secs(60));
    }

    #[test]
    fn test_timer_propagates_write_errors() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        assert!(matches!(
            Timer::start("Test 1", &mut Closed),
            Err(BenchError::Report { .. })
        ));
    }
}
