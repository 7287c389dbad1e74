//! Error types for system alert sound playback
//!
//! `AlertError` covers the failure modes of a single alert playback,
//! `ConfigError` covers loading and saving the configuration file.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons an alert playback stopped early
///
/// `AlertSoundPlayer::play` swallows all of these; `try_play` returns them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// The configuration service has no value under `key`
    #[error("Configuration key not available: {key}")]
    ConfigUnavailable {
        /// Key that was looked up
        key: String,
    },

    /// The value under `key` is not an integer
    #[error("Configuration key {key} holds a {found}, expected an integer")]
    ConfigTypeMismatch {
        /// Key that was looked up
        key: String,
        /// Type name of the stored value
        found: &'static str,
    },

    /// No audio session could be opened
    #[error("Audio service unavailable: {0}")]
    AudioServiceUnavailable(String),

    /// The sample could not be cached in the session
    #[error("Failed to register sample {sample}: {reason}")]
    SampleRegistrationFailed {
        /// Sample identifier passed to `play`
        sample: String,
        /// What went wrong
        reason: String,
    },
}

impl AlertError {
    pub(crate) fn registration(sample: &str, reason: impl ToString) -> Self {
        AlertError::SampleRegistrationFailed {
            sample: sample.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing the default config file failed
    #[error("Failed to write config file: {0}")]
    WriteError(#[from] std::io::Error),

    /// The config file is not valid TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The default config could not be serialized
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The platform has no user config directory
    #[error("Config directory not found")]
    NoConfigDir,
}

/// Result of an alert playback step
pub type AlertResult<T> = std::result::Result<T, AlertError>;
/// Result of a config file operation
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
