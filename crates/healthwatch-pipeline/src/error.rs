//! Pipeline error types
//!
//! Each failure class has its own type so callers can tell the recoverable
//! ones (a source failed, a line did not parse) from the ones that must abort
//! an invocation (the append channel or object store refused a write).

use thiserror::Error;

use crate::sources::SourceKind;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// One external source failed for one location.
///
/// Recovered by skipping the location for this run.
#[derive(Error, Debug)]
pub enum SourceFetchError {
    #[error("{source_kind} request failed: {error}")]
    Http {
        source_kind: SourceKind,
        #[source]
        error: reqwest::Error,
    },

    #[error("{source_kind} returned HTTP {status}")]
    Status {
        source_kind: SourceKind,
        status: reqwest::StatusCode,
    },

    #[error("{source_kind} returned a body that is not JSON: {error}")]
    Decode {
        source_kind: SourceKind,
        #[source]
        error: serde_json::Error,
    },
}

impl SourceFetchError {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            SourceFetchError::Http { source_kind, .. }
            | SourceFetchError::Status { source_kind, .. }
            | SourceFetchError::Decode { source_kind, .. } => *source_kind,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceFetchError::Http { error, .. } if error.is_timeout())
    }
}

/// The append channel refused a record. Never recovered locally.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Delivery channel rejected record: {0}")]
    Rejected(String),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] healthwatch_common::HealthwatchError),
}

/// An object-store read or write failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read object '{key}': {message}")]
    Get { key: String, message: String },

    #[error("Failed to write object '{key}': {message}")]
    Put { key: String, message: String },
}

/// Top-level error for an ingestion or validation invocation
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    SourceFetch(#[from] SourceFetchError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Common(#[from] healthwatch_common::HealthwatchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid object-created notification: {0}")]
    Event(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn event(msg: impl Into<String>) -> Self {
        Self::Event(msg.into())
    }
}
