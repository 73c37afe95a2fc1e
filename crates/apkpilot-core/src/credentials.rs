//! Stored GitHub credentials
//!
//! Credentials live in `~/.apkpilot/credentials.json`, outside any project
//! tree, so they can never be committed. Environment variables override the
//! stored values.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{CredentialsError, Result};

/// Token environment variables, highest priority first
pub const TOKEN_ENV_VARS: &[&str] = &["APKPILOT_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// Username environment variable
pub const USERNAME_ENV_VAR: &str = "APKPILOT_GITHUB_USERNAME";

/// Commit email environment variable
pub const EMAIL_ENV_VAR: &str = "APKPILOT_EMAIL";

/// GitHub token plus the identity used for commits
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Personal access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// GitHub username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Email used for commits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Credentials {
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            token: Some(token.into()),
            username: Some(username.into()),
            email: Some(email.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    /// Names of the fields that are missing or blank
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.token().is_none() {
            missing.push("token".to_string());
        }
        if self.username().is_none() {
            missing.push("username".to_string());
        }
        if self.email().is_none() {
            missing.push("email".to_string());
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Error unless every field is present
    pub fn require_complete(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CredentialsError::Incomplete(missing).into())
        }
    }

    /// Override fields from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| env::var(name).ok())
    }

    /// Override fields from an arbitrary variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = TOKEN_ENV_VARS.iter().copied().find_map(|name| lookup(name)) {
            debug!("using token from environment");
            self.token = Some(token);
        }
        if let Some(username) = lookup(USERNAME_ENV_VAR) {
            self.username = Some(username);
        }
        if let Some(email) = lookup(EMAIL_ENV_VAR) {
            self.email = Some(email);
        }
        self
    }
}

/// Reads and writes the credentials file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by an explicit file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.apkpilot/credentials.json`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or(CredentialsError::NoHomeDirectory)?;
        Ok(Self::new(home.join(".apkpilot").join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load stored credentials; a missing file yields empty credentials
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Credentials> {
        if !self.path.exists() {
            debug!("no stored credentials");
            return Ok(Credentials::default());
        }

        let content = fs::read_to_string(&self.path).map_err(CredentialsError::Io)?;
        let credentials = serde_json::from_str(&content).map_err(|e| CredentialsError::Invalid {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        debug!("loaded stored credentials");
        Ok(credentials)
    }

    /// Persist credentials, readable only by the current user
    #[instrument(skip(self, credentials), fields(path = %self.path.display()))]
    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(CredentialsError::Io)?;
        }

        let content = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, content).map_err(CredentialsError::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(CredentialsError::Io)?;
        }

        info!("saved credentials");
        Ok(())
    }

    /// Delete stored credentials, reporting whether a file existed
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn reset(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(CredentialsError::Io)?;
        info!("removed stored credentials");
        Ok(true)
    }
}
