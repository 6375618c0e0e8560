//! Analysis configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use neurotime_analysis::{
    BoundaryPolicy, CoherenceParams, EventRelatedParams, FilterParams, Scaling,
};

use crate::error::ConfigError;

/// Settings shared by every analysis command.
///
/// Every section is optional; missing values fall back to the analyzer
/// defaults.
///
/// # TOML Format
///
/// ```toml
/// sampling_interval = 2.0
///
/// [event_related]
/// window_len = 15
/// offset = -5
/// zscore = false
/// boundary = "drop"
///
/// [coherence]
/// segment_len = 64
/// overlap = 32
/// window = "hann"
///
/// [filter]
/// lb = 0.01
/// ub = 0.15
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Seconds between samples of the input files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_interval: Option<f64>,

    /// Event-related windowing.
    #[serde(default)]
    pub event_related: EventRelatedSection,

    /// Welch segmentation for coherence.
    #[serde(default)]
    pub coherence: CoherenceParams,

    /// Passband for the frequency-domain filter.
    #[serde(default)]
    pub filter: FilterParams,
}

/// The `[event_related]` section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventRelatedSection {
    /// Samples per trial window; must be given here or on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_len: Option<usize>,
    /// Window start relative to the event, in samples.
    pub offset: isize,
    /// Z-score the target before the cross-correlation estimate.
    pub zscore: bool,
    /// What to do with windows that leave the signal.
    pub boundary: BoundaryPolicy,
}

impl EventRelatedSection {
    /// Analyzer parameters, or `None` if no window length is configured.
    pub fn params(&self) -> Option<EventRelatedParams> {
        let scaling = if self.zscore {
            Scaling::ZScore
        } else {
            Scaling::Raw
        };
        self.window_len.map(|len| {
            EventRelatedParams::new(len)
                .with_offset(self.offset)
                .with_scaling(scaling)
                .with_boundary(self.boundary)
        })
    }
}

impl AnalysisConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load and validate in one step.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section; all problems are reported together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::validation::validate_config(self)?;
        Ok(())
    }

    /// Sampling rate implied by `sampling_interval`.
    pub fn sampling_rate(&self) -> Option<f64> {
        self.sampling_interval.map(|dt| 1.0 / dt)
    }
}
