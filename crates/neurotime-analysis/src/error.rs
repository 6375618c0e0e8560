//! Error types for analyzer computations.

use neurotime_core::SignalError;
use thiserror::Error;

/// Failures raised when an analyzer output is first computed.
///
/// The type is `Clone` because analyzers memoize failed computations as well
/// as successful ones; every later access returns the same error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Wrong channel count, mismatched inputs, or an invalid parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An event type has too few usable trials for the requested estimator.
    #[error("insufficient trials for event type {code}: {reason}")]
    InsufficientTrials {
        /// Event code, or 0 when no event of any type was found.
        code: u32,
        /// What was missing.
        reason: String,
    },

    /// A trial window or frequency bound lies outside the valid range.
    #[error("out of bounds: {0}")]
    OutOfBoundsWindow(String),

    /// The computation is undefined for this input (zero variance, singular system).
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Building an output series failed.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}

/// Convenience result type for analyzer outputs.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Create an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(reason.into())
    }

    /// Create an out-of-bounds error.
    pub fn out_of_bounds(reason: impl Into<String>) -> Self {
        AnalysisError::OutOfBoundsWindow(reason.into())
    }

    /// Create a numerical degeneracy error.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        AnalysisError::NumericalDegeneracy(reason.into())
    }

    /// Create an insufficient trials error.
    pub fn insufficient_trials(code: u32, reason: impl Into<String>) -> Self {
        AnalysisError::InsufficientTrials {
            code,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn insufficient_trials_display() {
        let err = AnalysisError::insufficient_trials(3, "all windows fell outside the signal");
        assert_eq!(
            err.to_string(),
            "insufficient trials for event type 3: all windows fell outside the signal"
        );
    }

    #[test]
    fn signal_error_is_source() {
        let err = AnalysisError::from(SignalError::Empty);
        assert!(matches!(err, AnalysisError::Signal(SignalError::Empty)));
        assert!(err.source().is_some());
    }

    #[test]
    fn factories_produce_matching_variants() {
        assert!(matches!(
            AnalysisError::invalid_input("x"),
            AnalysisError::InvalidInput(_)
        ));
        assert!(matches!(
            AnalysisError::out_of_bounds("x"),
            AnalysisError::OutOfBoundsWindow(_)
        ));
        assert!(matches!(
            AnalysisError::degenerate("x"),
            AnalysisError::NumericalDegeneracy(_)
        ));
    }
}
