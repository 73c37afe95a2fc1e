//! Build monitor
//!
//! Polls the build service at a fixed interval until the tracked run
//! completes, then either retrieves the artifact (success) or the run logs
//! (any other conclusion). States move `NotStarted -> Polling` and end in
//! one of the terminal states of [`MonitorState`].
//!
//! Each cycle performs exactly one run listing. Failed listings are logged
//! and retried by the next cycle. There is no sleep after the final cycle,
//! and cancellation is observed at the top of each cycle, during every
//! request and during the sleep between cycles.

mod outcome;
mod reporter;
mod session;
mod sleeper;

pub use outcome::{LogReport, MonitorOutcome, MonitorState, RetrievedArtifact};
pub use reporter::{CollectingReporter, MonitorEvent, MonitorReporter, TracingReporter};
pub use session::{MonitorSession, MonitorSettings};
pub use sleeper::{Sleeper, TokioSleeper};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::archive::extract_archive;
use crate::client::BuildService;
use crate::error::{ActionsError, Result};
use crate::logs::read_log_archive;
use crate::types::BuildRun;

/// Drives one build from "pushed" to a terminal outcome
pub struct BuildMonitor {
    service: Arc<dyn BuildService>,
    sleeper: Arc<dyn Sleeper>,
    reporter: Arc<dyn MonitorReporter>,
    settings: MonitorSettings,
    cancel: CancellationToken,
}

impl BuildMonitor {
    pub fn new(service: Arc<dyn BuildService>, settings: MonitorSettings) -> Self {
        Self {
            service,
            sleeper: Arc::new(TokioSleeper),
            reporter: Arc::new(TracingReporter),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn MonitorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that aborts the monitor when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Poll until the session's run reaches a terminal outcome.
    ///
    /// Never returns an error: every failure is folded into the outcome.
    #[instrument(skip(self, session), fields(repo = %session.repo, head_sha = ?session.head_sha))]
    pub async fn monitor_build(&self, session: &mut MonitorSession) -> MonitorOutcome {
        let start = Instant::now();
        session.state = MonitorState::Polling;
        let max_attempts = self.settings.max_attempts;

        while session.attempt < max_attempts {
            if self.cancel.is_cancelled() {
                return self.finish(session, start, MonitorOutcome::Cancelled {
                    attempts: session.attempt,
                });
            }

            session.attempt += 1;
            self.reporter.report(&MonitorEvent::Polling {
                attempt: session.attempt,
                max_attempts,
            });

            match self.guarded(self.service.list_runs(&session.repo)).await {
                Ok(runs) => match session.select_run(&runs) {
                    Some(run) => {
                        self.reporter
                            .report(&MonitorEvent::RunObserved { run: run.clone() });
                        if run.is_completed() {
                            let run = run.clone();
                            let outcome = self.conclude(session, run).await;
                            return self.finish(session, start, outcome);
                        }
                    }
                    None => self.reporter.report(&MonitorEvent::NoRuns),
                },
                Err(ActionsError::Cancelled) => {
                    return self.finish(session, start, MonitorOutcome::Cancelled {
                        attempts: session.attempt,
                    });
                }
                Err(e) => {
                    warn!(attempt = session.attempt, error = %e, "poll failed");
                    self.reporter.report(&MonitorEvent::PollFailed {
                        error: e.to_string(),
                    });
                }
            }

            if session.attempt < max_attempts {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        return self.finish(session, start, MonitorOutcome::Cancelled {
                            attempts: session.attempt,
                        });
                    }
                    _ = self.sleeper.sleep(self.settings.poll_interval) => {}
                }
            }
        }

        self.finish(session, start, MonitorOutcome::TimedOut {
            attempts: session.attempt,
        })
    }

    /// Handle a completed run
    async fn conclude(&self, session: &MonitorSession, run: BuildRun) -> MonitorOutcome {
        if run.succeeded() {
            match self.retrieve_artifact(session, &run).await {
                Ok(artifact) => MonitorOutcome::Succeeded { run, artifact },
                Err(ActionsError::Cancelled) => MonitorOutcome::Cancelled {
                    attempts: session.attempt,
                },
                Err(e) => {
                    warn!(run_id = %run.id, error = %e, "artifact retrieval failed");
                    MonitorOutcome::ArtifactRetrievalFailed {
                        run,
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            self.reporter
                .report(&MonitorEvent::FetchingLogs { run_id: run.id });

            let logs = match self
                .guarded(self.service.fetch_logs(&session.repo, run.id))
                .await
            {
                Ok(payload) => match read_log_archive(&payload) {
                    Ok(entries) => LogReport::Available(entries),
                    Err(e) => LogReport::Unavailable(e.to_string()),
                },
                Err(ActionsError::Cancelled) => {
                    return MonitorOutcome::Cancelled {
                        attempts: session.attempt,
                    };
                }
                Err(e) => {
                    warn!(run_id = %run.id, error = %e, "could not fetch run logs");
                    LogReport::Unavailable(e.to_string())
                }
            };

            MonitorOutcome::Failed { run, logs }
        }
    }

    /// List artifacts, download the named one, extract it and locate the APK
    async fn retrieve_artifact(
        &self,
        session: &MonitorSession,
        run: &BuildRun,
    ) -> Result<RetrievedArtifact> {
        let name = &self.settings.artifact_name;
        let artifacts = self
            .guarded(self.service.list_artifacts(&session.repo, run.id))
            .await?;

        let artifact = artifacts
            .into_iter()
            .find(|a| &a.name == name)
            .ok_or_else(|| {
                ActionsError::NotFound(format!("no artifact named '{}' on run {}", name, run.id))
            })?;

        self.reporter.report(&MonitorEvent::DownloadingArtifact {
            name: artifact.name.clone(),
        });
        let payload = self.guarded(self.service.download_artifact(&artifact)).await?;

        let extracted = extract_archive(&payload, &self.settings.output_dir)?;

        // Only files from this artifact count; the output dir outlives runs
        let suffix = &self.settings.artifact_suffix;
        let path = extracted.find_by_suffix(suffix).ok_or_else(|| {
            ActionsError::NotFound(format!(
                "no file ending in '{}' inside artifact '{}'",
                suffix, name
            ))
        })?;

        RetrievedArtifact::from_file(artifact.name, &path)
    }

    /// Race a request against cancellation
    async fn guarded<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ActionsError::Cancelled),
            result = request => result,
        }
    }

    fn finish(
        &self,
        session: &mut MonitorSession,
        start: Instant,
        outcome: MonitorOutcome,
    ) -> MonitorOutcome {
        session.state = outcome.state();
        info!(
            repo = %session.repo,
            attempts = session.attempt,
            state = ?session.state,
            duration_ms = start.elapsed().as_millis() as u64,
            "monitor finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_bytes;
    use crate::types::{Artifact, Conclusion, RepoId, RunId, RunStatus};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Scripted build service
    #[derive(Default)]
    struct FakeService {
        polls: Mutex<VecDeque<Result<Vec<BuildRun>>>>,
        artifacts: Vec<Artifact>,
        artifact_payload: Vec<u8>,
        log_payload: Option<Vec<u8>>,
        list_calls: Mutex<u32>,
        log_calls: Mutex<Vec<RunId>>,
        artifact_calls: Mutex<Vec<RunId>>,
        download_calls: Mutex<u32>,
    }

    impl FakeService {
        fn with_polls(polls: Vec<Result<Vec<BuildRun>>>) -> Self {
            Self {
                polls: Mutex::new(polls.into()),
                ..Default::default()
            }
        }

        fn list_calls(&self) -> u32 {
            *self.list_calls.lock().unwrap()
        }

        fn download_calls(&self) -> u32 {
            *self.download_calls.lock().unwrap()
        }

        fn log_calls(&self) -> Vec<RunId> {
            self.log_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuildService for FakeService {
        async fn list_runs(&self, _repo: &RepoId) -> Result<Vec<BuildRun>> {
            *self.list_calls.lock().unwrap() += 1;
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_logs(&self, _repo: &RepoId, run_id: RunId) -> Result<Vec<u8>> {
            self.log_calls.lock().unwrap().push(run_id);
            self.log_payload
                .clone()
                .ok_or_else(|| ActionsError::NotFound("logs".to_string()))
        }

        async fn list_artifacts(&self, _repo: &RepoId, run_id: RunId) -> Result<Vec<Artifact>> {
            self.artifact_calls.lock().unwrap().push(run_id);
            Ok(self.artifacts.clone())
        }

        async fn download_artifact(&self, _artifact: &Artifact) -> Result<Vec<u8>> {
            *self.download_calls.lock().unwrap() += 1;
            Ok(self.artifact_payload.clone())
        }
    }

    /// Records requested delays without waiting
    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
        cancel_on_sleep: Option<CancellationToken>,
    }

    impl RecordingSleeper {
        fn count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            if let Some(token) = &self.cancel_on_sleep {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }
    }

    fn in_progress(id: u64) -> BuildRun {
        BuildRun::new(id, RunStatus::InProgress, None)
    }

    fn completed(id: u64, conclusion: Conclusion) -> BuildRun {
        BuildRun::new(id, RunStatus::Completed, Some(conclusion))
    }

    fn apk_artifact() -> Artifact {
        Artifact::new(1, "app-debug", "https://example.invalid/zip")
    }

    fn session() -> MonitorSession {
        MonitorSession::new(RepoId::new("octocat", "my-app"))
    }

    fn settings(dir: &TempDir, max_attempts: u32) -> MonitorSettings {
        MonitorSettings::default()
            .with_max_attempts(max_attempts)
            .with_output_dir(dir.path().join("out"))
    }

    fn monitor(
        service: &Arc<FakeService>,
        sleeper: &Arc<RecordingSleeper>,
        settings: MonitorSettings,
    ) -> BuildMonitor {
        BuildMonitor::new(service.clone(), settings).with_sleeper(sleeper.clone())
    }

    #[tokio::test]
    async fn test_success_on_first_poll() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService {
            artifacts: vec![apk_artifact()],
            artifact_payload: zip_bytes(&[("app-debug.apk", b"apk")]),
            ..FakeService::with_polls(vec![Ok(vec![completed(42, Conclusion::Success)])])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let mut session = session();
        let outcome = monitor.monitor_build(&mut session).await;

        match &outcome {
            MonitorOutcome::Succeeded { run, artifact } => {
                assert_eq!(run.id, RunId(42));
                assert_eq!(artifact.path, temp.path().join("out").join("app-debug.apk"));
                assert_eq!(artifact.size, 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.state, MonitorState::Succeeded);
        assert_eq!(session.attempt, 1);
        assert_eq!(*service.artifact_calls.lock().unwrap(), vec![RunId(42)]);
        assert_eq!(service.download_calls(), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_leftover_apk_is_not_reported_as_success() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("app-debug.apk"), "OLD").unwrap();

        let service = Arc::new(FakeService {
            artifacts: vec![apk_artifact()],
            artifact_payload: zip_bytes(&[("output-metadata.json", b"{}")]),
            ..FakeService::with_polls(vec![Ok(vec![completed(9, Conclusion::Success)])])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 3));

        let mut session = session();
        let outcome = monitor.monitor_build(&mut session).await;

        match &outcome {
            MonitorOutcome::ArtifactRetrievalFailed { run, reason } => {
                assert_eq!(run.id, RunId(9));
                assert!(reason.contains(".apk"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(out.join("app-debug.apk")).unwrap(), "OLD");
    }

    #[tokio::test]
    async fn test_failure_after_in_progress_polls() {
        let temp = TempDir::new().unwrap();
        let mut polls: Vec<_> = (0..5).map(|_| Ok(vec![in_progress(7)])).collect();
        polls.push(Ok(vec![completed(7, Conclusion::Failure)]));
        let service = Arc::new(FakeService {
            log_payload: Some(zip_bytes(&[("build/1_Build.txt", b"BUILD FAILED\n")])),
            ..FakeService::with_polls(polls)
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let outcome = monitor.monitor_build(&mut session()).await;

        match &outcome {
            MonitorOutcome::Failed { run, logs } => {
                assert_eq!(run.id, RunId(7));
                let LogReport::Available(entries) = logs else {
                    panic!("logs should be available");
                };
                assert!(entries[0].content.contains("BUILD FAILED"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(service.list_calls(), 6);
        assert_eq!(service.log_calls(), vec![RunId(7)]);
        assert_eq!(service.download_calls(), 0);
        assert_eq!(sleeper.count(), 5);
    }

    #[tokio::test]
    async fn test_empty_polls_stay_polling() {
        let temp = TempDir::new().unwrap();
        let mut polls: Vec<_> = (0..3).map(|_| Ok(Vec::new())).collect();
        polls.push(Ok(vec![completed(9, Conclusion::Success)]));
        let service = Arc::new(FakeService {
            artifacts: vec![apk_artifact()],
            artifact_payload: zip_bytes(&[("app-debug.apk", b"apk")]),
            ..FakeService::with_polls(polls)
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let reporter = Arc::new(CollectingReporter::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60)).with_reporter(reporter.clone());

        let mut session = session();
        let outcome = monitor.monitor_build(&mut session).await;

        assert!(outcome.is_success());
        assert_eq!(session.attempt, 4);
        let no_runs = reporter
            .events()
            .iter()
            .filter(|e| **e == MonitorEvent::NoRuns)
            .count();
        assert_eq!(no_runs, 3);
    }

    #[tokio::test]
    async fn test_times_out_without_trailing_sleep() {
        let temp = TempDir::new().unwrap();
        let polls = (0..10).map(|_| Ok(vec![in_progress(1)])).collect();
        let service = Arc::new(FakeService::with_polls(polls));
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 5));

        let mut session = session();
        let outcome = monitor.monitor_build(&mut session).await;

        assert_eq!(outcome, MonitorOutcome::TimedOut { attempts: 5 });
        assert_eq!(session.state, MonitorState::TimedOut);
        assert_eq!(service.list_calls(), 5);
        assert_eq!(sleeper.count(), 4);
        assert!(service.log_calls().is_empty());
        assert_eq!(service.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_error_is_retried_next_cycle() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService {
            artifacts: vec![apk_artifact()],
            artifact_payload: zip_bytes(&[("app-debug.apk", b"apk")]),
            ..FakeService::with_polls(vec![
                Err(ActionsError::Api {
                    status: 502,
                    message: "Bad Gateway".to_string(),
                }),
                Ok(vec![completed(3, Conclusion::Success)]),
            ])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let reporter = Arc::new(CollectingReporter::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60)).with_reporter(reporter.clone());

        let outcome = monitor.monitor_build(&mut session()).await;

        assert!(outcome.is_success());
        assert_eq!(service.list_calls(), 2);
        assert!(reporter
            .events()
            .iter()
            .any(|e| matches!(e, MonitorEvent::PollFailed { .. })));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_partial_success() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService {
            artifacts: vec![Artifact::new(2, "app-release", "https://example.invalid/zip")],
            ..FakeService::with_polls(vec![Ok(vec![completed(42, Conclusion::Success)])])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let mut session = session();
        let outcome = monitor.monitor_build(&mut session).await;

        match &outcome {
            MonitorOutcome::ArtifactRetrievalFailed { run, reason } => {
                assert_eq!(run.id, RunId(42));
                assert!(reason.contains("app-debug"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.state, MonitorState::Succeeded);
        assert_eq!(service.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_partial_success() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService {
            artifacts: vec![apk_artifact()],
            artifact_payload: b"definitely not a zip".to_vec(),
            ..FakeService::with_polls(vec![Ok(vec![completed(42, Conclusion::Success)])])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let outcome = monitor.monitor_build(&mut session()).await;

        match &outcome {
            MonitorOutcome::ArtifactRetrievalFailed { reason, .. } => {
                assert!(reason.contains("Corrupt archive"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(service.download_calls(), 1);
    }

    #[tokio::test]
    async fn test_artifact_without_apk_is_partial_success() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService {
            artifacts: vec![apk_artifact()],
            artifact_payload: zip_bytes(&[("output-metadata.json", b"{}")]),
            ..FakeService::with_polls(vec![Ok(vec![completed(42, Conclusion::Success)])])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let outcome = monitor.monitor_build(&mut session()).await;
        assert!(matches!(outcome, MonitorOutcome::ArtifactRetrievalFailed { .. }));
    }

    #[tokio::test]
    async fn test_tracks_pushed_commit() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService {
            log_payload: Some(zip_bytes(&[("build/1_Build.txt", b"oops\n")])),
            ..FakeService::with_polls(vec![
                // Another commit's run finished first and must be ignored
                Ok(vec![completed(5, Conclusion::Success).with_head_sha("other")]),
                Ok(vec![
                    completed(5, Conclusion::Success).with_head_sha("other"),
                    in_progress(6).with_head_sha("abc123"),
                ]),
                Ok(vec![
                    completed(6, Conclusion::Failure).with_head_sha("abc123"),
                    completed(5, Conclusion::Success).with_head_sha("other"),
                ]),
            ])
        });
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let mut session = session().with_head_sha("abc123");
        let outcome = monitor.monitor_build(&mut session).await;

        assert_eq!(outcome.run().unwrap().id, RunId(6));
        assert_eq!(session.state, MonitorState::Failed);
        assert_eq!(service.list_calls(), 3);
        assert_eq!(service.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService::default());
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));
        monitor.cancellation_token().cancel();

        let mut session = session();
        let outcome = monitor.monitor_build(&mut session).await;

        assert_eq!(outcome, MonitorOutcome::Cancelled { attempts: 0 });
        assert_eq!(session.state, MonitorState::Cancelled);
        assert_eq!(service.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_sleep() {
        let temp = TempDir::new().unwrap();
        let token = CancellationToken::new();
        let service = Arc::new(FakeService::with_polls(vec![Ok(vec![in_progress(1)])]));
        let sleeper = Arc::new(RecordingSleeper {
            cancel_on_sleep: Some(token.clone()),
            ..Default::default()
        });
        let monitor = monitor(&service, &sleeper, settings(&temp, 60)).with_cancellation(token);

        let outcome = monitor.monitor_build(&mut session()).await;

        assert_eq!(outcome, MonitorOutcome::Cancelled { attempts: 1 });
        assert_eq!(service.list_calls(), 1);
        assert_eq!(sleeper.count(), 1);
    }

    #[tokio::test]
    async fn test_missing_logs_still_report_failure() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService::with_polls(vec![Ok(vec![completed(
            8,
            Conclusion::Cancelled,
        )])]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let monitor = monitor(&service, &sleeper, settings(&temp, 60));

        let outcome = monitor.monitor_build(&mut session()).await;

        match &outcome {
            MonitorOutcome::Failed { run, logs } => {
                assert_eq!(run.conclusion, Some(Conclusion::Cancelled));
                assert!(matches!(logs, LogReport::Unavailable(_)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(service.log_calls(), vec![RunId(8)]);
    }

    #[tokio::test]
    async fn test_sleeps_for_poll_interval() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService::with_polls(vec![
            Ok(vec![in_progress(1)]),
            Ok(vec![completed(1, Conclusion::Failure)]),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let settings = settings(&temp, 60).with_poll_interval(Duration::from_secs(3));
        let monitor = monitor(&service, &sleeper, settings);

        monitor.monitor_build(&mut session()).await;
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_secs(3)]
        );
    }
}
