//! Remote and branch configuration

use tracing::{info, instrument};

use apkpilot_core::error::GitError;

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Get list of remote names
    pub fn remotes(&self) -> Result<Vec<String>> {
        let remotes = self.repo.remotes()?;
        Ok(remotes
            .iter()
            .filter_map(|r| r.map(|s| s.to_string()))
            .collect())
    }

    /// Check if a remote exists
    pub fn has_remote(&self, name: &str) -> Result<bool> {
        Ok(self.remotes()?.iter().any(|r| r == name))
    }

    /// Get the URL for a remote
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::RemoteNotFound(name.to_string()))
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Point `name` at `url`, creating or replacing the remote
    #[instrument(skip(self))]
    pub fn set_remote(&self, name: &str, url: &str) -> Result<()> {
        if self.has_remote(name)? {
            self.repo.remote_set_url(name, url)?;
            info!(remote = name, url, "updated remote");
        } else {
            self.repo.remote(name, url)?;
            info!(remote = name, url, "added remote");
        }
        Ok(())
    }

    /// Rename the checked-out branch, or retarget an unborn HEAD
    #[instrument(skip(self))]
    pub fn rename_current_branch(&self, new_name: &str) -> Result<()> {
        let current = self.current_branch()?;
        if current.as_deref() == Some(new_name) {
            return Ok(());
        }

        match self.repo.head() {
            Ok(_) => {
                let current = current.as_deref().ok_or_else(|| {
                    GitError::OpenFailed("HEAD is detached; check out a branch first".to_string())
                })?;
                let mut branch = self
                    .repo
                    .find_branch(current, git2::BranchType::Local)?;
                branch.rename(new_name, true)?;
                self.repo.set_head(&format!("refs/heads/{}", new_name))?;
            }
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                self.repo.set_head(&format!("refs/heads/{}", new_name))?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(from = ?current, to = new_name, "renamed branch");
        Ok(())
    }
}
