//! Shared build monitoring for `build` and `watch`

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use apkpilot_actions::{
    BuildMonitor, CancellationToken, ClientConfig, GitHubActionsClient, LogReport, MonitorEvent,
    MonitorOutcome, MonitorReporter, MonitorSession, MonitorSettings, TracingReporter,
};
use apkpilot_core::config::{Config, MonitorConfig};

use crate::cli::output::{self, format_size, path_style};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Authenticated API client for the configured GitHub instance
pub(crate) fn actions_client(config: &Config, token: &str) -> anyhow::Result<GitHubActionsClient> {
    let client_config = ClientConfig::new(token)
        .with_api_url(&config.github.api_url)
        .with_request_timeout(config.monitor.request_timeout());
    Ok(GitHubActionsClient::new(client_config)?)
}

/// Monitor settings from the `monitor` config section
pub(crate) fn monitor_settings(config: &MonitorConfig) -> MonitorSettings {
    MonitorSettings::default()
        .with_poll_interval(config.poll_interval())
        .with_max_attempts(config.max_attempts)
        .with_artifact(&config.artifact_name, &config.artifact_suffix)
        .with_output_dir(&config.output_dir)
}

/// Spinner shown while the monitor polls
struct SpinnerReporter {
    bar: ProgressBar,
    /// Print every observed run state above the spinner
    verbose: bool,
}

impl SpinnerReporter {
    fn new(repo: &str, verbose: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_message(format!("Waiting for the build of {}", repo));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, verbose }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl MonitorReporter for SpinnerReporter {
    fn report(&self, event: &MonitorEvent) {
        TracingReporter.report(event);

        match event {
            MonitorEvent::Polling {
                attempt,
                max_attempts,
            } => {
                self.bar
                    .set_message(format!("Checking build status ({}/{})", attempt, max_attempts));
            }
            MonitorEvent::NoRuns => {
                self.bar
                    .set_message("Waiting for the workflow run to start".to_string());
            }
            MonitorEvent::RunObserved { run } => {
                let message = format!("Run {} is {}", run.id, run.status);
                if self.verbose {
                    self.bar.println(format!("{} {}", style("→").blue(), message));
                }
                self.bar.set_message(message);
            }
            MonitorEvent::PollFailed { error } => {
                self.bar.println(format!(
                    "{} Status check failed, retrying: {}",
                    style("!").yellow().bold(),
                    error
                ));
            }
            MonitorEvent::DownloadingArtifact { name } => {
                self.bar.set_message(format!("Downloading {}", name));
            }
            MonitorEvent::FetchingLogs { run_id } => {
                self.bar
                    .set_message(format!("Fetching logs for run {}", run_id));
            }
        }
    }
}

/// Poll a build to completion and report the outcome.
///
/// Returns the exit code matching the outcome.
pub(crate) async fn run_monitor(
    cli: &Cli,
    config: &Config,
    token: &str,
    mut session: MonitorSession,
) -> anyhow::Result<i32> {
    let client = actions_client(config, token)?;
    let settings = monitor_settings(&config.monitor);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut monitor =
        BuildMonitor::new(Arc::new(client), settings).with_cancellation(cancel.clone());

    let spinner = if cli.is_interactive_text() {
        let spinner = Arc::new(SpinnerReporter::new(&session.repo.full_name(), cli.verbose));
        monitor = monitor.with_reporter(spinner.clone());
        Some(spinner)
    } else {
        None
    };

    info!(repo = %session.repo, head_sha = ?session.head_sha, "monitoring build");
    let outcome = monitor.monitor_build(&mut session).await;
    cancel.cancel();

    if let Some(spinner) = spinner {
        spinner.finish();
    }

    report_outcome(cli, config, &session, &outcome)?;
    Ok(exit_codes::for_outcome(&outcome))
}

/// Print an outcome in the selected format
fn report_outcome(
    cli: &Cli,
    config: &Config,
    session: &MonitorSession,
    outcome: &MonitorOutcome,
) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    let actions_url = config
        .github
        .actions_url(&session.repo.owner, &session.repo.name);

    match outcome {
        MonitorOutcome::Succeeded { run, artifact } => {
            if cli.quiet {
                println!("{}", artifact.path.display());
                return Ok(());
            }
            output::success(&format!("Build {} succeeded", run.id));
            println!(
                "{}",
                output::key_value(
                    "APK",
                    &path_style().apply_to(artifact.path.display()).to_string()
                )
            );
            println!("{}", output::key_value("Size", &format_size(artifact.size)));
            println!("{}", output::key_value("SHA-256", &artifact.sha256));
        }
        MonitorOutcome::Failed { run, logs } => {
            output::error(&format!(
                "Build {} failed ({})",
                run.id,
                run.conclusion_label()
            ));
            if !cli.quiet {
                print_logs(logs);
            }
            if let Some(url) = &run.html_url {
                output::info(&format!("Run details: {}", url));
            }
        }
        MonitorOutcome::ArtifactRetrievalFailed { run, reason } => {
            output::warning(&format!(
                "Build {} succeeded, but the artifact could not be retrieved",
                run.id
            ));
            println!("{}", output::key_value("Reason", reason));
            output::info(&format!("Download it manually from {}", actions_url));
        }
        MonitorOutcome::TimedOut { .. } | MonitorOutcome::Cancelled { .. } => {
            output::warning(&outcome.summary());
            output::info(&format!("Build status: {}", actions_url));
        }
    }

    Ok(())
}

/// Print every log entry of a failed run
fn print_logs(logs: &LogReport) {
    match logs {
        LogReport::Available(entries) if entries.is_empty() => {
            output::warning("The run produced no log output");
        }
        LogReport::Available(entries) => {
            for entry in entries {
                println!();
                println!("{}", output::header(&format!("── {} ──", entry.name)));
                println!("{}", entry.content.trim_end());
            }
            println!();
        }
        LogReport::Unavailable(reason) => {
            output::warning(&format!("Build logs are unavailable: {}", reason));
        }
    }
}
