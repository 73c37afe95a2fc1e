//! Pushing through the git CLI
//!
//! The token is handed to git as a one-shot `http.extraheader` through the
//! `GIT_CONFIG_*` environment variables. It never appears in the remote URL,
//! in `.git/config`, or in the process arguments.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, instrument, warn};

use apkpilot_core::error::GitError;

use crate::repository::Result;

/// Parameters for a single push
#[derive(Clone)]
pub struct PushOptions {
    /// Repository working directory
    pub workdir: PathBuf,
    pub remote: String,
    pub branch: String,
    /// Overwrite the remote branch
    pub force: bool,
    /// GitHub token for HTTPS remotes
    pub auth_token: Option<String>,
}

impl fmt::Debug for PushOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushOptions")
            .field("workdir", &self.workdir)
            .field("remote", &self.remote)
            .field("branch", &self.branch)
            .field("force", &self.force)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PushOptions {
    pub fn new(
        workdir: impl Into<PathBuf>,
        remote: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            workdir: workdir.into(),
            remote: remote.into(),
            branch: branch.into(),
            force: false,
            auth_token: None,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec!["push".to_string()];
        if self.force {
            args.push("--force".to_string());
        }
        args.push("--set-upstream".to_string());
        args.push(self.remote.clone());
        args.push(self.branch.clone());
        args
    }
}

/// Header value git sends with every HTTPS request of this push
fn auth_header(token: &str) -> String {
    let credentials = STANDARD.encode(format!("x-access-token:{}", token));
    format!("AUTHORIZATION: basic {}", credentials)
}

/// A rejected push, with git's error output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl PushFailure {
    /// Suggested fix for common failures
    pub fn hint(&self) -> Option<&'static str> {
        let stderr = self.stderr.to_lowercase();
        if stderr.contains("authentication failed")
            || stderr.contains("invalid username or password")
            || stderr.contains("could not read username")
        {
            Some("Check the stored token with `apkpilot setup`; it needs the repo and workflow scopes")
        } else if stderr.contains("repository not found") {
            Some("The remote repository does not exist or the token cannot access it")
        } else if stderr.contains("refusing to allow") && stderr.contains("workflow") {
            Some("The token lacks the workflow scope required to push workflow files")
        } else if stderr.contains("non-fast-forward")
            || stderr.contains("fetch first")
            || stderr.contains("[rejected]")
        {
            Some("The remote branch has other commits; pull them first or rerun with --force-push")
        } else if stderr.contains("remote rejected") {
            Some("The remote refused the push; check branch protection rules")
        } else {
            None
        }
    }
}

impl fmt::Display for PushFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.stderr.trim();
        match self.exit_code {
            Some(code) => write!(f, "git push exited with status {}", code)?,
            None => write!(f, "git push was terminated")?,
        }
        if !detail.is_empty() {
            write!(f, ": {}", detail)?;
        }
        if let Some(hint) = self.hint() {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// Push a branch using the git CLI
#[instrument(fields(remote = %options.remote, branch = %options.branch, force = options.force))]
pub fn git_push(options: &PushOptions) -> Result<()> {
    let git = which::which("git").map_err(|_| GitError::GitNotInstalled)?;
    let start = std::time::Instant::now();

    let mut command = Command::new(git);
    command
        .args(options.args())
        .current_dir(&options.workdir)
        .env("GIT_TERMINAL_PROMPT", "0");

    if let Some(token) = &options.auth_token {
        command
            .env("GIT_CONFIG_COUNT", "1")
            .env("GIT_CONFIG_KEY_0", "http.extraheader")
            .env("GIT_CONFIG_VALUE_0", auth_header(token));
    }

    let output = command
        .output()
        .map_err(|e| GitError::PushFailed(format!("failed to run git: {}", e)))?;

    info!(
        remote = %options.remote,
        branch = %options.branch,
        duration_ms = start.elapsed().as_millis(),
        success = output.status.success(),
        "git push (CLI)"
    );

    if output.status.success() {
        return Ok(());
    }

    let failure = PushFailure {
        exit_code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    warn!(error = %failure, "push rejected");
    Err(GitError::PushFailed(failure.to_string()))
}

/// Delete the `.git` directory of a project, reporting whether one existed
#[instrument(fields(path = %path.display()))]
pub fn remove_git_dir(path: &Path) -> Result<bool> {
    let git_dir = path.join(".git");
    if !git_dir.exists() {
        return Ok(false);
    }

    std::fs::remove_dir_all(&git_dir)
        .map_err(|e| GitError::OpenFailed(format!("failed to remove {}: {}", git_dir.display(), e)))?;
    info!(path = %git_dir.display(), "removed git directory");
    Ok(true)
}
