use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;

/// This enum contains all error messages this library can return. Most API functions will generally return a [`Result<T, BenchError>`].
///
/// A violated postcondition inside a benchmark run is not an error value: it is
/// reported through telemetry and then aborts the run.
///
/// [`Result<T, BenchError>`]: std::result::Result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BenchError {
    /// The seed argument could not be parsed as an unsigned 64-bit integer.
    InvalidSeed {
        /// The text that failed to parse.
        input: String,
    },
    /// The benchmark configuration is inconsistent, usually a workload with a zero range.
    InvalidConfig {
        /// Further specifies why the configuration was invalid.
        info: String,
    },
    /// No algorithm matches the given name.
    UnknownAlgorithm {
        /// The name that was looked up.
        name: String,
    },
    /// Only 32- and 64-bit words are supported.
    UnsupportedWidth {
        /// The requested width in bits.
        bits: u32,
    },
    /// The operating system entropy source could not be read.
    Entropy {
        /// A description of the failure.
        context: String,
    },
    /// Writing the progress report failed.
    Report {
        /// A description of the write failure.
        context: String,
    },
}

impl Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::InvalidSeed { input } => {
                write!(f, "Invalid seed {:?}: expected an unsigned 64-bit integer", input)
            }
            BenchError::InvalidConfig { info } => {
                write!(f, "Invalid configuration: {}", info)
            }
            BenchError::UnknownAlgorithm { name } => {
                write!(f, "Unknown algorithm {:?}", name)
            }
            BenchError::UnsupportedWidth { bits } => {
                write!(f, "Unsupported word width {}: expected 32 or 64", bits)
            }
            BenchError::Entropy { context } => {
                write!(f, "Entropy source error: {}", context)
            }
            BenchError::Report { context } => {
                write!(f, "Report error: {}", context)
            }
        }
    }
}

impl Error for BenchError {}

impl From<io::Error> for BenchError {
    fn from(err: io::Error) -> Self {
        BenchError::Report {
            context: err.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_offending_value() {
        let err = BenchError::InvalidSeed {
            input: "12abc".to_owned(),
        };
        assert!(err.to_string().contains("\"12abc\""));

        let err = BenchError::UnsupportedWidth { bits: 16 };
        assert!(err.to_string().contains("16"));

        let err = BenchError::UnknownAlgorithm {
            name: "mystery".to_owned(),
        };
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_io_error_converts_to_report() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err = BenchError::from(io_err);
        match err {
            BenchError::Report { context } => assert!(context.contains("pipe closed")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
