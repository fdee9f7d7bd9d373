//! Provides [`SimError`], the error taxonomy for everything the core simulation engine can
//! fail on without panicking.
//!
//! Three of the four failure modes named by the design (config error, invariant violation,
//! reporter I/O error) are represented here. The fourth, a transient biological miss (an
//! event whose target clone or person vanished before it ran), is deliberately *not* a
//! variant: it is handled inline as an early return in event dispatch, because by design it
//! must not be surfaced as an error or logged above `trace`.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum SimError {
    /// Malformed YAML, an out-of-range id, or a missing required raster. Surfaced at
    /// initialization, before the first tick.
    Config(String),
    /// A broken invariant: schedule-in-past, index-slot mismatch, etc. These are bugs, not
    /// recoverable conditions; callers that detect one should panic with this variant's
    /// `Display` text rather than propagate it.
    InvariantViolation { day: i32, detail: String },
    /// A reporter failed to write its output. Logged and otherwise ignored: reporting is
    /// lossy, the model is not.
    ReporterIo(std::io::Error),
}

impl From<serde_yaml::Error> for SimError {
    fn from(error: serde_yaml::Error) -> Self {
        SimError::Config(error.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(error: std::io::Error) -> Self {
        SimError::ReporterIo(error)
    }
}

impl From<csv::Error> for SimError {
    fn from(error: csv::Error) -> Self {
        match error.into_kind() {
            csv::ErrorKind::Io(io_error) => SimError::ReporterIo(io_error),
            other => SimError::Config(other.to_string()),
        }
    }
}

impl std::error::Error for SimError {}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::Config(message) => write!(f, "configuration error: {message}"),
            SimError::InvariantViolation { day, detail } => {
                write!(f, "invariant violation on day {day}: {detail}")
            }
            SimError::ReporterIo(error) => write!(f, "reporter I/O error: {error}"),
        }
    }
}

/// Panics with a structured, grep-able message. Call sites use this instead of `unreachable!()`
/// or a bare `assert!` so that invariant violations are consistently formatted and testable via
/// `#[should_panic(expected = "invariant violation")]`.
#[track_caller]
pub fn fail_invariant(day: i32, detail: impl Into<String>) -> ! {
    panic!(
        "{}",
        SimError::InvariantViolation {
            day,
            detail: detail.into()
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "invariant violation on day 5: scheduled in the past")]
    fn fail_invariant_formats_message() {
        fail_invariant(5, "scheduled in the past");
    }

    #[test]
    fn config_error_wraps_yaml_error() {
        let yaml_error = serde_yaml::from_str::<i32>("not: valid: : yaml").unwrap_err();
        let error: SimError = yaml_error.into();
        assert!(matches!(error, SimError::Config(_)));
    }
}
