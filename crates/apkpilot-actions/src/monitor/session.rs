//! Monitor settings and per-invocation session state

use std::path::PathBuf;
use std::time::Duration;

use crate::types::{BuildRun, RepoId};

use super::outcome::MonitorState;

/// Fixed polling parameters and artifact selection for one monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Delay between poll cycles
    pub poll_interval: Duration,
    /// Poll cycle ceiling before giving up
    pub max_attempts: u32,
    /// Exact name of the artifact to download on success
    pub artifact_name: String,
    /// Suffix of the file to locate inside the extracted artifact
    pub artifact_suffix: String,
    /// Directory the artifact is extracted into
    pub output_dir: PathBuf,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_attempts: 60,
            artifact_name: "app-debug".to_string(),
            artifact_suffix: ".apk".to_string(),
            output_dir: PathBuf::from("build-artifacts"),
        }
    }
}

impl MonitorSettings {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_artifact(mut self, name: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.artifact_name = name.into();
        self.artifact_suffix = suffix.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Upper bound on time spent sleeping between polls
    pub fn sleep_budget(&self) -> Duration {
        self.poll_interval * self.max_attempts.saturating_sub(1)
    }
}

/// State for a single `monitor_build` invocation
#[derive(Debug, Clone)]
pub struct MonitorSession {
    pub repo: RepoId,
    /// Commit the session is waiting on; `None` follows the newest run
    pub head_sha: Option<String>,
    /// Poll cycles performed so far
    pub attempt: u32,
    pub state: MonitorState,
}

impl MonitorSession {
    pub fn new(repo: RepoId) -> Self {
        Self {
            repo,
            head_sha: None,
            attempt: 0,
            state: MonitorState::NotStarted,
        }
    }

    /// Only consider runs triggered for this commit
    pub fn with_head_sha(mut self, sha: impl Into<String>) -> Self {
        let sha = sha.into();
        self.head_sha = if sha.is_empty() { None } else { Some(sha) };
        self
    }

    /// Pick the run this session tracks from a newest-first run list
    pub fn select_run<'a>(&self, runs: &'a [BuildRun]) -> Option<&'a BuildRun> {
        match &self.head_sha {
            Some(sha) => runs.iter().find(|run| run.matches_commit(sha)),
            None => runs.first(),
        }
    }
}
