//! Core error types for focusmode-core.
//!
//! Invalid state transitions are not errors: the engine treats them as
//! no-ops and returns `None`. What remains here are bad inputs, config
//! file problems and a stopped timer service.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusmode-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer input errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer service errors
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by timer inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Unrecognized session type or out-of-range setting
    #[error("Invalid value for '{field}': {message}")]
    InvalidArgument { field: String, message: String },
}

impl TimerError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        TimerError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Neither an override nor a home directory is available
    #[error("Could not determine configuration directory")]
    NoDataDir,
}

/// Errors from talking to a [`crate::TimerService`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service task has stopped and no longer accepts commands
    #[error("timer service is no longer running")]
    Closed,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
