//! Configuration validation.
//!
//! Parsing only checks the shape of the document. [`validate_config`] checks
//! the values: positive sampling interval, a usable Welch segmentation, and
//! filter bounds that are ordered and, when the sampling interval is known,
//! below Nyquist.
//!
//! # Example
//!
//! ```rust
//! use neurotime_config::{AnalysisConfig, validate_config};
//!
//! let config = AnalysisConfig::from_toml("[filter]\nlb = 5.0\nub = 1.0\n").unwrap();
//! assert!(validate_config(&config).is_err());
//! ```

use thiserror::Error;

use crate::config::AnalysisConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A value outside its allowed range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the setting.
        field: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Two settings that contradict each other.
    #[error("'{field}': {reason}")]
    Inconsistent {
        /// Dotted path of the setting.
        field: String,
        /// What is wrong.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(value.is_finite() && value >= min && value <= max) {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

/// Validate every section of a configuration.
///
/// A single problem is returned as is; several are wrapped in
/// [`ValidationError::Multiple`].
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if let Some(dt) = config.sampling_interval
        && !(dt.is_finite() && dt > 0.0)
    {
        errors.push(ValidationError::Inconsistent {
            field: "sampling_interval".to_string(),
            reason: format!("must be finite and positive, got {dt}"),
        });
    }

    if config.event_related.window_len == Some(0) {
        errors.push(ValidationError::Inconsistent {
            field: "event_related.window_len".to_string(),
            reason: "must be at least 1 sample".to_string(),
        });
    }

    let coherence = &config.coherence;
    if coherence.segment_len < 2 {
        errors.push(ValidationError::Inconsistent {
            field: "coherence.segment_len".to_string(),
            reason: format!("must be at least 2, got {}", coherence.segment_len),
        });
    } else if coherence.overlap >= coherence.segment_len {
        errors.push(ValidationError::Inconsistent {
            field: "coherence.overlap".to_string(),
            reason: format!(
                "{} must be smaller than the segment length {}",
                coherence.overlap, coherence.segment_len
            ),
        });
    }

    let nyquist = config
        .sampling_interval
        .filter(|dt| dt.is_finite() && *dt > 0.0)
        .map_or(f64::INFINITY, |dt| 0.5 / dt);
    let filter = &config.filter;
    if let Some(lb) = filter.lb {
        check_range(&mut errors, "filter.lb", lb, 0.0, nyquist);
    }
    if let Some(ub) = filter.ub {
        check_range(&mut errors, "filter.ub", ub, 0.0, nyquist);
    }
    if let (Some(lb), Some(ub)) = (filter.lb, filter.ub)
        && lb > ub
    {
        errors.push(ValidationError::Inconsistent {
            field: "filter".to_string(),
            reason: format!("lower bound {lb} is above upper bound {ub}"),
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurotime_analysis::{CoherenceParams, FilterParams};

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn test_negative_interval() {
        let config = AnalysisConfig {
            sampling_interval: Some(-1.0),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::Inconsistent { ref field, .. }) if field == "sampling_interval"
        ));
    }

    #[test]
    fn test_zero_window() {
        let mut config = AnalysisConfig::default();
        config.event_related.window_len = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_overlap_must_be_shorter_than_segment() {
        let config = AnalysisConfig {
            coherence: CoherenceParams {
                segment_len: 16,
                overlap: 16,
                ..CoherenceParams::default()
            },
            ..AnalysisConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("coherence.overlap"), "got: {err}");
    }

    #[test]
    fn test_filter_above_nyquist() {
        let config = AnalysisConfig {
            sampling_interval: Some(0.5),
            filter: FilterParams::lowpass(1.5),
            ..AnalysisConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "filter.ub".to_string(),
                value: 1.5,
                min: 0.0,
                max: 1.0,
            }
        );
    }

    #[test]
    fn test_filter_without_interval_only_checks_order() {
        let config = AnalysisConfig {
            filter: FilterParams::bandpass(10.0, 1000.0),
            ..AnalysisConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_multiple_errors_are_collected() {
        let config = AnalysisConfig {
            sampling_interval: Some(0.0),
            filter: FilterParams::bandpass(-1.0, -2.0),
            ..AnalysisConfig::default()
        };
        match validate_config(&config) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
