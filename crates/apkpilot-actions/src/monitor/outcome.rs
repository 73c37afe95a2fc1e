//! Terminal monitor outcomes

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::logs::LogEntry;
use crate::types::BuildRun;

/// Where a monitor session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    NotStarted,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotStarted | Self::Polling)
    }
}

/// The build output located on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievedArtifact {
    /// Artifact name on the build service
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Hex-encoded SHA-256 of the file
    pub sha256: String,
}

impl RetrievedArtifact {
    /// Describe a file on disk, hashing its contents
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self {
            name: name.into(),
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&bytes)),
        })
    }
}

/// Logs gathered for a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogReport {
    Available(Vec<LogEntry>),
    /// Logs could not be fetched or decoded
    Unavailable(String),
}

impl LogReport {
    /// Render every log file, or only its last `tail` lines
    pub fn render(&self, tail: Option<usize>) -> String {
        match self {
            Self::Available(entries) if entries.is_empty() => "(the log archive is empty)".to_string(),
            Self::Available(entries) => entries
                .iter()
                .map(|entry| {
                    let body = match tail {
                        Some(n) => entry.tail(n).join("\n"),
                        None => entry.content.trim_end().to_string(),
                    };
                    format!("==> {} <==\n{}", entry.name, body)
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            Self::Unavailable(reason) => format!("(logs unavailable: {})", reason),
        }
    }
}

/// How a monitor session ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MonitorOutcome {
    /// Build succeeded and the artifact was extracted
    Succeeded {
        run: BuildRun,
        artifact: RetrievedArtifact,
    },
    /// Build completed without success
    Failed { run: BuildRun, logs: LogReport },
    /// No terminal run within the attempt ceiling
    TimedOut { attempts: u32 },
    /// Build succeeded but its artifact could not be retrieved
    ArtifactRetrievalFailed { run: BuildRun, reason: String },
    /// The caller cancelled the session
    Cancelled { attempts: u32 },
}

impl MonitorOutcome {
    pub fn state(&self) -> MonitorState {
        match self {
            Self::Succeeded { .. } | Self::ArtifactRetrievalFailed { .. } => MonitorState::Succeeded,
            Self::Failed { .. } => MonitorState::Failed,
            Self::TimedOut { .. } => MonitorState::TimedOut,
            Self::Cancelled { .. } => MonitorState::Cancelled,
        }
    }

    /// Build succeeded and the artifact is on disk
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The run the session ended on, if any
    pub fn run(&self) -> Option<&BuildRun> {
        match self {
            Self::Succeeded { run, .. }
            | Self::Failed { run, .. }
            | Self::ArtifactRetrievalFailed { run, .. } => Some(run),
            Self::TimedOut { .. } | Self::Cancelled { .. } => None,
        }
    }

    /// Human-readable description of the outcome
    pub fn summary(&self) -> String {
        match self {
            Self::Succeeded { run, artifact } => format!(
                "Build {} succeeded. APK saved to {} ({} bytes, sha256 {})",
                run.id,
                artifact.path.display(),
                artifact.size,
                artifact.sha256
            ),
            Self::Failed { run, logs } => format!(
                "Build {} failed ({}).\n\n{}",
                run.id,
                run.conclusion_label(),
                logs.render(None)
            ),
            Self::TimedOut { attempts } => format!(
                "Build did not finish after {} status checks. \
                 Check the Actions tab of the repository manually.",
                attempts
            ),
            Self::ArtifactRetrievalFailed { run, reason } => format!(
                "Build {} succeeded, but the artifact could not be retrieved: {}",
                run.id, reason
            ),
            Self::Cancelled { attempts } => {
                format!("Monitoring cancelled after {} status checks", attempts)
            }
        }
    }
}
