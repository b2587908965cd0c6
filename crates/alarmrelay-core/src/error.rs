//! Error types for AlarmRelay

use thiserror::Error;

/// Result type alias using AlarmRelay's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for AlarmRelay operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required notification field is missing or cannot be parsed
    #[error("Malformed notification: {field}: {reason}")]
    MalformedNotification {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Notification channel rejected or failed to deliver a message
    #[error("Publish error: {0}")]
    Publish(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed notification error
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedNotification {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-field error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::malformed(field, "missing")
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a publish error
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error describes bad input rather than a failed operation
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedNotification { .. })
    }
}
