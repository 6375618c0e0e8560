//! Configuration management for neurotime analyses.
//!
//! One TOML document sets the sampling interval of the input files and the
//! parameters of the event-related, coherence, and filter analyzers. The CLI
//! reads it from `--config` or from the per-user default path; command-line
//! flags override individual values.
//!
//! # Example
//!
//! ```rust,no_run
//! use neurotime_config::{AnalysisConfig, default_config_path};
//!
//! let mut config = AnalysisConfig::from_toml(
//!     r#"
//! sampling_interval = 0.002
//!
//! [event_related]
//! window_len = 100
//! offset = -20
//! "#,
//! )
//! .unwrap();
//! config.validate().unwrap();
//!
//! config.filter.ub = Some(40.0);
//! config.save(default_config_path()).unwrap();
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

/// Configuration validation.
pub mod validation;

pub use config::{AnalysisConfig, EventRelatedSection};
pub use error::ConfigError;
pub use paths::{default_config_path, ensure_user_config_dir, resolve_config, user_config_dir};
pub use validation::{ValidationError, ValidationResult, validate_config};
