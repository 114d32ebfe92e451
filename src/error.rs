//! Error types used by the restartvisor runtime.
//!
//! This module defines three error enums:
//!
//! - [`SchedulerError`] — invalid requests rejected at the scheduling boundary.
//! - [`DisplayError`] — progress-display lifecycle violations.
//! - [`ConfigError`] — configuration loading/parsing failures.
//!
//! Validation errors are caught at the boundary (command or builder layer) and
//! never reach the tick loop. [`DisplayError`] signals a sequencing bug in the
//! caller rather than a runtime condition: the countdown guards every display
//! call, so observing one of these outside tests indicates broken invariants.

use thiserror::Error;

/// # Errors produced by restart scheduling operations.
///
/// These represent requests that are rejected before any state is mutated.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The requested restart delay is below the one-second tick granularity.
    #[error("restart delay must be at least 1 second (got {seconds})")]
    InvalidDuration {
        /// The rejected delay, as given by the caller.
        seconds: i64,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use restartvisor::SchedulerError;
    ///
    /// let err = SchedulerError::InvalidDuration { seconds: 0 };
    /// assert_eq!(err.as_label(), "scheduler_invalid_duration");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::InvalidDuration { .. } => "scheduler_invalid_duration",
        }
    }
}

/// # Errors produced by the progress display state machine.
///
/// The display only supports `Stopped -> Running -> Stopped`. Driving it out
/// of sequence is a caller bug; the countdown reports any occurrence on the
/// event bus instead of propagating it into the tick loop.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DisplayError {
    /// A countdown display cannot be started for less than one second.
    #[error("display total must be 1 or more (got {total})")]
    InvalidTotal {
        /// The rejected total.
        total: u64,
    },

    /// `start` was called while the display was already running.
    #[error("progress display is already running")]
    AlreadyRunning,

    /// `update` or `stop` was called while the display was stopped.
    #[error("progress display is not running")]
    NotRunning,
}

impl DisplayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DisplayError::InvalidTotal { .. } => "display_invalid_total",
            DisplayError::AlreadyRunning => "display_already_running",
            DisplayError::NotRunning => "display_not_running",
        }
    }
}

/// # Errors produced while loading configuration files.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_error_display_carries_value() {
        let err = SchedulerError::InvalidDuration { seconds: -3 };
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn display_error_labels_are_stable() {
        assert_eq!(
            DisplayError::InvalidTotal { total: 0 }.as_label(),
            "display_invalid_total"
        );
        assert_eq!(DisplayError::AlreadyRunning.as_label(), "display_already_running");
        assert_eq!(DisplayError::NotRunning.as_label(), "display_not_running");
    }
}
