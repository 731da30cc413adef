//! Error types for fwswitchd

use std::path::PathBuf;
use thiserror::Error;

/// Firewall policy errors
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A rule record has the wrong shape or an invalid token
    #[error("Malformed rule at line {line}: {reason}")]
    MalformedRule { line: usize, reason: String },

    /// The rule file could not be read
    #[error("Failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PolicyError {
    /// Creates a malformed rule error.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        PolicyError::MalformedRule {
            line,
            reason: reason.into(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file is not valid TOML for the config schema
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value is out of range or inconsistent with another
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Event replay errors
#[derive(Error, Debug)]
pub enum ReplayError {
    /// A line is not a valid replay event
    #[error("Invalid replay event at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy operations
pub type PolicyResult<T> = std::result::Result<T, PolicyError>;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for event replay
pub type ReplayResult<T> = std::result::Result<T, ReplayError>;
