//! Workflow run and artifact types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository on the build service, addressed as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Account or organization that owns the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a new repository identifier
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` string
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    /// Get the `owner/name` form
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Opaque workflow run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    Pending,
    Waiting,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Only `completed` ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome classification of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    TimedOut,
    ActionRequired,
    Neutral,
    Skipped,
    Stale,
    StartupFailure,
    #[serde(other)]
    Other,
}

impl Conclusion {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::Neutral => "neutral",
            Self::Skipped => "skipped",
            Self::Stale => "stale",
            Self::StartupFailure => "startup_failure",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one workflow run, fetched fresh on every poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRun {
    pub id: RunId,
    pub status: RunStatus,
    /// Present only once the run is completed
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl BuildRun {
    /// Create a run snapshot with only the fields the monitor needs
    pub fn new(id: u64, status: RunStatus, conclusion: Option<Conclusion>) -> Self {
        Self {
            id: RunId(id),
            status,
            conclusion,
            name: None,
            head_sha: None,
            head_branch: None,
            created_at: None,
            html_url: None,
        }
    }

    /// Set the commit SHA the run was triggered for
    pub fn with_head_sha(mut self, sha: impl Into<String>) -> Self {
        self.head_sha = Some(sha.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Completed with a `success` conclusion
    pub fn succeeded(&self) -> bool {
        self.is_completed() && self.conclusion.is_some_and(|c| c.is_success())
    }

    /// Whether the run was triggered for the given commit (prefix match allowed)
    pub fn matches_commit(&self, sha: &str) -> bool {
        match &self.head_sha {
            Some(head) => !sha.is_empty() && head.starts_with(sha),
            None => false,
        }
    }

    /// Conclusion text for display, `-` while the run is still going
    pub fn conclusion_label(&self) -> &'static str {
        self.conclusion.map(|c| c.as_str()).unwrap_or("-")
    }
}

/// A named build output attached to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    /// Download handle for the compressed archive
    pub archive_download_url: String,
    #[serde(default)]
    pub size_in_bytes: u64,
    #[serde(default)]
    pub expired: bool,
}

impl Artifact {
    pub fn new(id: u64, name: impl Into<String>, archive_download_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            archive_download_url: archive_download_url.into(),
            size_in_bytes: 0,
            expired: false,
        }
    }
}

/// `GET /repos/{owner}/{repo}/actions/runs` response body
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunsPage {
    #[serde(default)]
    pub workflow_runs: Vec<BuildRun>,
}

/// `GET /repos/{owner}/{repo}/actions/runs/{id}/artifacts` response body
#[derive(Debug, Deserialize)]
pub(crate) struct ArtifactsPage {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_parse() {
        let repo = RepoId::parse("octocat/hello-world").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
        assert_eq!(repo.to_string(), "octocat/hello-world");

        assert!(RepoId::parse("no-slash").is_none());
        assert!(RepoId::parse("/name").is_none());
        assert!(RepoId::parse("a/b/c").is_none());
    }

    #[test]
    fn test_deserialize_runs_page() {
        let body = r#"{
            "total_count": 2,
            "workflow_runs": [
                {"id": 42, "status": "completed", "conclusion": "success",
                 "head_sha": "abc123", "head_branch": "main",
                 "created_at": "2024-01-01T10:00:00Z"},
                {"id": 41, "status": "in_progress", "conclusion": null}
            ]
        }"#;

        let page: WorkflowRunsPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.workflow_runs.len(), 2);

        let latest = &page.workflow_runs[0];
        assert_eq!(latest.id, RunId(42));
        assert!(latest.succeeded());
        assert!(latest.matches_commit("abc"));

        let older = &page.workflow_runs[1];
        assert_eq!(older.status, RunStatus::InProgress);
        assert!(older.conclusion.is_none());
        assert!(!older.is_completed());
    }

    #[test]
    fn test_unknown_status_and_conclusion() {
        let run: BuildRun =
            serde_json::from_str(r#"{"id": 1, "status": "brand_new", "conclusion": "mystery"}"#)
                .unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert_eq!(run.conclusion, Some(Conclusion::Other));
        assert!(!run.is_completed());
    }

    #[test]
    fn test_completed_failure_is_not_success() {
        let run = BuildRun::new(7, RunStatus::Completed, Some(Conclusion::Failure));
        assert!(run.is_completed());
        assert!(!run.succeeded());
        assert_eq!(run.conclusion_label(), "failure");
    }

    #[test]
    fn test_matches_commit_requires_sha() {
        let run = BuildRun::new(1, RunStatus::Queued, None);
        assert!(!run.matches_commit("abc"));

        let run = run.with_head_sha("abc123");
        assert!(run.matches_commit("abc123"));
        assert!(!run.matches_commit(""));
        assert!(!run.matches_commit("def"));
    }
}
