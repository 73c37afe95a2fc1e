//! Staging and committing

use chrono::{TimeZone, Utc};
use git2::{ErrorCode, IndexAddOption};
use tracing::{debug, info, instrument};

use apkpilot_core::error::GitError;

use crate::repository::{GitRepo, Result};
use crate::types::CommitInfo;

impl GitRepo {
    /// Stage every change (honoring `.gitignore`) and commit it.
    ///
    /// Returns `None` when the staged tree matches HEAD, so running twice
    /// does not create empty commits.
    #[instrument(skip(self))]
    pub fn commit_all(&self, message: &str) -> Result<Option<CommitInfo>> {
        let start = std::time::Instant::now();

        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let unchanged = match &parent {
            Some(parent) => parent.tree_id() == tree_id,
            None => index.is_empty(),
        };
        if unchanged {
            debug!("nothing to commit");
            return Ok(None);
        }

        let signature = self.signature()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(|e| GitError::CommitFailed(e.message().to_string()))?;

        let commit = self.repo.find_commit(oid)?;
        let info = commit_to_info(&commit);
        info!(
            hash = %info.short_hash,
            files = index.len(),
            duration_ms = start.elapsed().as_millis(),
            "created commit"
        );
        Ok(Some(info))
    }
}

/// Convert a git2 Commit to CommitInfo
fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();

    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    CommitInfo::new(
        commit.id().to_string(),
        commit.summary().unwrap_or("(no message)"),
        author.name().unwrap_or("Unknown"),
        author.email().unwrap_or("unknown@example.com"),
        timestamp,
    )
}
