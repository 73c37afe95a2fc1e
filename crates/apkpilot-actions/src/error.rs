//! Actions error types

use thiserror::Error;

/// Errors raised while talking to the build service or handling its archives
#[derive(Debug, Error)]
pub enum ActionsError {
    /// Connectivity failure or request timeout
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success response from the API
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Requested resource does not exist (logs, artifact, repository)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Token lacks a required scope
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Archive could not be decoded
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ActionsError {
    /// Whether the next poll cycle may succeed where this one failed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }

    /// Whether the error reports a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for Actions operations
pub type Result<T> = std::result::Result<T, ActionsError>;
