//! Core error types for Remedy.
//!
//! This module defines the central error type shared by every crate in the
//! workspace. Subsystem crates keep their own error enums and convert into
//! this one at crate boundaries where needed.

use thiserror::Error;

/// Central error type for Remedy operations.
#[derive(Error, Debug)]
pub enum RemedyError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input URL rejected before entering the pipeline
    #[error("invalid advisory URL '{url}': {reason}")]
    InvalidInputUrl {
        /// The rejected input
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `RemedyError`.
pub type Result<T> = std::result::Result<T, RemedyError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
