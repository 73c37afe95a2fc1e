//! apkpilot Core - configuration and local state for apkpilot
//!
//! This crate provides the error taxonomy, project configuration, stored
//! credentials, workflow templating and Android project detection used by
//! the `apkpilot` binary.

pub mod config;
pub mod credentials;
pub mod error;
pub mod templates;

pub use config::Config;
pub use credentials::{CredentialStore, Credentials};
pub use error::{ApkPilotError, ConfigError, CredentialsError, GitError, Result, TemplateError};
pub use templates::{
    ensure_gitignore, is_android_project, AndroidWorkflowTemplate, CITemplate, TemplateOptions,
};
