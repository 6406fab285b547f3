//! Error types for the vpnswitch daemon
//!
//! Per-attempt failures (`ConnectError`, `VerifyError`) are always recovered
//! by the rotation loop. Only `FatalError` ends the loop.

use thiserror::Error;

/// Main error type for the vpnswitch application
#[derive(Error, Debug)]
pub enum SwitchError {
    /// Errors related to configuration loading/parsing or startup settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors that stop the rotation loop
    #[error("Fatal error: {0}")]
    Fatal(#[from] FatalError),

    /// Errors from a single control-tool command
    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    /// Errors managing the detached daemon process
    #[error("Daemon error: {reason}")]
    Daemon { reason: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("Failed to apply setting {option}={value}: {reason}")]
    SettingFailed {
        option: String,
        value: String,
        reason: String,
    },

    #[error("{failed} of {total} startup settings could not be applied")]
    PartiallyApplied { failed: usize, total: usize },
}

/// Failure of a single invocation of the VPN control tool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("Failed to spawn {binary}: {reason}")]
    Spawn { binary: String, reason: String },

    #[error("`{command}` exited with status {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds} seconds")]
    Timeout { command: String, seconds: u64 },
}

/// The connect command failed or timed out
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Connection to {location} failed: {reason}")]
    Failed { location: String, reason: String },

    #[error("Connection to {location} timed out after {seconds} seconds")]
    TimedOut { location: String, seconds: u64 },
}

impl ConnectError {
    /// Classify a control-tool failure raised while connecting to `location`
    pub fn from_control(location: &str, error: ControlError) -> Self {
        match error {
            ControlError::Timeout { seconds, .. } => ConnectError::TimedOut {
                location: location.to_string(),
                seconds,
            },
            other => ConnectError::Failed {
                location: location.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// The post-connect status check did not confirm a live tunnel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Status query failed: {reason}")]
    StatusUnavailable { reason: String },

    #[error("Status query timed out after {seconds} seconds")]
    TimedOut { seconds: u64 },

    #[error("Status does not report a connection: {status}")]
    NotConnected { status: String },
}

impl From<ControlError> for VerifyError {
    fn from(error: ControlError) -> Self {
        match error {
            ControlError::Timeout { seconds, .. } => VerifyError::TimedOut { seconds },
            other => VerifyError::StatusUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

/// Errors that abort the rotation loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("Location catalog is empty")]
    EmptyCatalog,

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("VPN control tool `{binary}` not found: {reason}")]
    ToolNotFound { binary: String, reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SwitchError>;
