//! Platform-specific configuration paths.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/neurotime/` (Linux),
//!   `~/Library/Application Support/neurotime/` (macOS), `%APPDATA%\neurotime\` (Windows)
//! - **Default config file**: `analysis.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use neurotime_config::paths;
//!
//! // The file the CLI reads when no --config is given
//! println!("Default config: {:?}", paths::default_config_path());
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "neurotime";

/// File name of the per-user default configuration.
pub const CONFIG_FILE_NAME: &str = "analysis.toml";

/// Returns the user-specific configuration directory.
///
/// # Platform Paths
///
/// - Linux: `~/.config/neurotime/`
/// - macOS: `~/Library/Application Support/neurotime/`
/// - Windows: `%APPDATA%\neurotime\`
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the per-user default `analysis.toml`.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

/// Pick the configuration file to read.
///
/// An explicit path is returned as is, whether or not it exists, so that a
/// typo surfaces as a read error. Otherwise the default file is used if it
/// exists.
pub fn resolve_config(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(default_config_path()).filter(|path| path.is_file()),
    }
}
