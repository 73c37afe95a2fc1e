//! Monitor progress reporting

use std::sync::Mutex;

use crate::types::{BuildRun, RunId};

/// Events emitted while a build is being monitored
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A poll cycle is starting
    Polling { attempt: u32, max_attempts: u32 },
    /// The service returned no run for this session yet
    NoRuns,
    /// The tracked run was observed
    RunObserved { run: BuildRun },
    /// Listing runs failed; the next cycle retries
    PollFailed { error: String },
    /// The build succeeded and its artifact is being downloaded
    DownloadingArtifact { name: String },
    /// The build failed and its logs are being fetched
    FetchingLogs { run_id: RunId },
}

/// Receives monitor progress
pub trait MonitorReporter: Send + Sync {
    fn report(&self, event: &MonitorEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl MonitorReporter for TracingReporter {
    fn report(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Polling {
                attempt,
                max_attempts,
            } => {
                tracing::debug!("Checking build status ({}/{})", attempt, max_attempts);
            }
            MonitorEvent::NoRuns => {
                tracing::debug!("No workflow run registered yet");
            }
            MonitorEvent::RunObserved { run } => {
                tracing::info!(
                    "Run {} is {} ({})",
                    run.id,
                    run.status,
                    run.conclusion_label()
                );
            }
            MonitorEvent::PollFailed { error } => {
                tracing::warn!("Status check failed, retrying next cycle: {}", error);
            }
            MonitorEvent::DownloadingArtifact { name } => {
                tracing::info!("Downloading artifact {}", name);
            }
            MonitorEvent::FetchingLogs { run_id } => {
                tracing::info!("Fetching logs for run {}", run_id);
            }
        }
    }
}

/// Reporter that collects events for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<MonitorEvent>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl MonitorReporter for CollectingReporter {
    fn report(&self, event: &MonitorEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
