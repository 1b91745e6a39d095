//! Error types for Healthwatch

use thiserror::Error;

/// Result type alias for Healthwatch operations
pub type Result<T> = std::result::Result<T, HealthwatchError>;

/// Main error type for Healthwatch
#[derive(Error, Debug)]
pub enum HealthwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid location '{name}': {reason}")]
    InvalidLocation { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl HealthwatchError {
    pub fn invalid_location(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
