//! apkpilot Actions - remote build monitoring for apkpilot
//!
//! This crate talks to the GitHub Actions REST API on behalf of the CLI:
//!
//! - **Client**: lists workflow runs, fetches run logs and artifacts
//! - **Archive**: extracts downloaded artifact archives and locates the APK
//! - **Monitor**: polls a repository until its build finishes and drives
//!   artifact retrieval or log collection
//! - **Account**: verifies tokens and creates repositories
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use apkpilot_actions::{
//!     BuildMonitor, ClientConfig, GitHubActionsClient, MonitorSession, MonitorSettings, RepoId,
//! };
//!
//! let client = GitHubActionsClient::new(ClientConfig::new(token))?;
//! let monitor = BuildMonitor::new(Arc::new(client), MonitorSettings::default());
//! let mut session = MonitorSession::new(RepoId::new("octocat", "my-app"));
//! let outcome = monitor.monitor_build(&mut session).await;
//! println!("{}", outcome.summary());
//! ```

pub mod account;
pub mod archive;
pub mod client;
pub mod error;
pub mod logs;
pub mod monitor;
pub mod types;

#[cfg(test)]
mod test_server;

pub use account::{CreateRepository, Identity, RepositoryCreation};
pub use archive::{extract_archive, find_by_suffix, ExtractedArchive};
pub use client::{BuildService, ClientConfig, GitHubActionsClient, GITHUB_API_BASE};
pub use error::{ActionsError, Result};
pub use logs::{read_log_archive, LogEntry};
pub use monitor::{
    BuildMonitor, CollectingReporter, LogReport, MonitorEvent, MonitorOutcome, MonitorReporter,
    MonitorSession, MonitorSettings, MonitorState, RetrievedArtifact, Sleeper, TokioSleeper,
    TracingReporter,
};
pub use types::{Artifact, BuildRun, Conclusion, RepoId, RunId, RunStatus};

// Re-exported so callers can cancel a monitor without depending on tokio-util
pub use tokio_util::sync::CancellationToken;
