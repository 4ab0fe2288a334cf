//! Error types for ProjectFlow
//!
//! One error enum covers local failures (validation, codec, stale writes,
//! partial batches) and the pass-through kinds reported by project adapters.
//! Uses thiserror for ergonomic error handling.

use crate::adapter::retry::{RetryDecision, RetryableError};
use crate::model::ValidationError;
use crate::sync::BatchReport;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for ProjectFlow operations
pub type Result<T> = std::result::Result<T, ProjectFlowError>;

/// Error type for ProjectFlow operations
#[derive(Error, Debug)]
pub enum ProjectFlowError {
    /// Malformed input, caught before any external call
    #[error("Validation failed: {}", join_validation(.0))]
    Validation(Vec<ValidationError>),

    /// A field value does not fit its field's type or options
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    /// A field type outside the supported set
    #[error("Unsupported field type: {0}")]
    UnsupportedFieldType(String),

    /// Stale write: the caller's version is not the current one
    #[error("Version conflict on {resource}: expected {expected}, current is {actual}")]
    VersionConflict {
        resource: String,
        expected: u64,
        actual: u64,
    },

    /// A multi-resource creation stopped part way through
    #[error("{}", .0.summary())]
    PartialBatchFailure(Box<BatchReport>),

    /// The adapter rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited (retry-after duration in seconds)
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found in the external system
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient transport failure inside an adapter
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProjectFlowError {
    /// Build a validation error from a single problem
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProjectFlowError::Validation(vec![ValidationError::new(field, message)])
    }

    /// Short label used for telemetry and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectFlowError::Validation(_) => "validation",
            ProjectFlowError::InvalidFieldValue { .. } => "invalid_field_value",
            ProjectFlowError::UnsupportedFieldType(_) => "unsupported_field_type",
            ProjectFlowError::VersionConflict { .. } => "version_conflict",
            ProjectFlowError::PartialBatchFailure(_) => "partial_batch_failure",
            ProjectFlowError::Unauthorized(_) => "unauthorized",
            ProjectFlowError::RateLimited(_) => "rate_limited",
            ProjectFlowError::NotFound(_) => "not_found",
            ProjectFlowError::Transport(_) => "transport",
            ProjectFlowError::Config(_) => "config",
            ProjectFlowError::Io(_) => "io",
            ProjectFlowError::Json(_) => "json",
            ProjectFlowError::Yaml(_) => "yaml",
        }
    }
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<fieldcodec::Error> for ProjectFlowError {
    fn from(err: fieldcodec::Error) -> Self {
        match err {
            fieldcodec::Error::InvalidFieldValue { field, reason } => {
                ProjectFlowError::InvalidFieldValue { field, reason }
            }
            fieldcodec::Error::UnsupportedFieldType(name) => {
                ProjectFlowError::UnsupportedFieldType(name)
            }
        }
    }
}

impl RetryableError for ProjectFlowError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            // Retryable errors
            ProjectFlowError::Transport(_) => RetryDecision::Retry,
            ProjectFlowError::RateLimited(secs) => {
                RetryDecision::RetryAfter(Duration::from_secs(*secs))
            }
            ProjectFlowError::Io(e) => match e.kind() {
                std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::Interrupted => RetryDecision::Retry,
                _ => RetryDecision::NoRetry,
            },
            // Local and permanent errors are surfaced unchanged
            ProjectFlowError::Validation(_) => RetryDecision::NoRetry,
            ProjectFlowError::InvalidFieldValue { .. } => RetryDecision::NoRetry,
            ProjectFlowError::UnsupportedFieldType(_) => RetryDecision::NoRetry,
            ProjectFlowError::VersionConflict { .. } => RetryDecision::NoRetry,
            ProjectFlowError::PartialBatchFailure(_) => RetryDecision::NoRetry,
            ProjectFlowError::Unauthorized(_) => RetryDecision::NoRetry,
            ProjectFlowError::NotFound(_) => RetryDecision::NoRetry,
            ProjectFlowError::Config(_) => RetryDecision::NoRetry,
            ProjectFlowError::Json(_) => RetryDecision::NoRetry,
            ProjectFlowError::Yaml(_) => RetryDecision::NoRetry,
        }
    }
}
