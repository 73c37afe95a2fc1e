//! Error types for apkpilot

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ApkPilotError
pub type Result<T> = std::result::Result<T, ApkPilotError>;

/// Main error type for apkpilot operations
#[derive(Debug, Error)]
pub enum ApkPilotError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Credential storage errors
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// Template rendering errors
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Configuration file already exists
    #[error("Configuration file already exists at {0}")]
    AlreadyExists(PathBuf),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// No commits found
    #[error("No commits found in repository")]
    NoCommits,

    /// Failed to commit
    #[error("Failed to commit: {0}")]
    CommitFailed(String),

    /// Failed to push
    #[error("Failed to push to remote: {0}")]
    PushFailed(String),

    /// Remote not found
    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    /// The git executable is not installed
    #[error("git executable not found on PATH")]
    GitNotInstalled,

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Credential storage errors
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No home directory to store credentials in
    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    /// Stored credentials are missing required fields
    #[error("Credentials incomplete, missing: {}", .0.join(", "))]
    Incomplete(Vec<String>),

    /// Stored credentials file is unreadable
    #[error("Invalid credentials file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Template rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A template option has an unusable value
    #[error("Invalid template option {option}: {message}")]
    InvalidOption { option: String, message: String },

    /// Target file exists and overwriting was not requested
    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApkPilotError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
