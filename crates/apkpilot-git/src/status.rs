//! Repository status operations

use git2::{ErrorCode, StatusOptions};

use crate::repository::{GitRepo, Result};

impl GitRepo {
    fn status_options() -> StatusOptions {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        opts
    }

    /// Check if the working directory is clean (no uncommitted changes)
    pub fn is_clean(&self) -> Result<bool> {
        let statuses = self.repo.statuses(Some(&mut Self::status_options()))?;

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
                || status.is_wt_new()
                || status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Whether anything (including untracked files) would be committed
    pub fn has_changes(&self) -> Result<bool> {
        Ok(!self.is_clean()?)
    }

    /// Get the current branch name.
    ///
    /// On a fresh repository HEAD is unborn; the branch it will create is
    /// returned. A detached HEAD yields `None`.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                return Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(|name| name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            // Detached HEAD
            Ok(None)
        }
    }

    /// Paths that would be staged by a commit
    pub fn changed_files(&self) -> Result<Vec<String>> {
        let statuses = self.repo.statuses(Some(&mut Self::status_options()))?;
        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::init(temp.path(), "main").unwrap();
        repo.set_identity("Test", "test@example.com").unwrap();
        std::fs::write(temp.path().join("file.txt"), "content").unwrap();
        repo.commit_all("Initial commit").unwrap();
        (temp, repo)
    }

    #[test]
    fn test_is_clean() {
        let (_temp, repo) = setup_repo();
        assert!(repo.is_clean().unwrap());
        assert!(!repo.has_changes().unwrap());
    }

    #[test]
    fn test_untracked_file_is_a_change() {
        let (temp, repo) = setup_repo();
        std::fs::write(temp.path().join("new_file.txt"), "new").unwrap();
        assert!(repo.has_changes().unwrap());
        assert_eq!(repo.changed_files().unwrap(), vec!["new_file.txt"]);
    }

    #[test]
    fn test_ignored_file_is_not_a_change() {
        let (temp, repo) = setup_repo();
        std::fs::write(temp.path().join(".gitignore"), "*.apk\n").unwrap();
        repo.commit_all("Ignore apks").unwrap();

        std::fs::write(temp.path().join("app-debug.apk"), "binary").unwrap();
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_current_branch() {
        let (_temp, repo) = setup_repo();
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }
}
