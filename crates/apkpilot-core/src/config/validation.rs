//! Configuration validation

use std::path::Component;

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_name(config)?;
    validate_github(config)?;
    validate_git(config)?;
    validate_workflow(config)?;
    validate_monitor(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> crate::error::ApkPilotError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
    .into()
}

fn validate_name(config: &Config) -> Result<()> {
    if let Some(name) = &config.name {
        if name.trim().is_empty() {
            return Err(invalid("name", "repository name cannot be empty"));
        }
        if name.contains('/') || name.contains(char::is_whitespace) {
            return Err(invalid("name", "must not contain '/' or whitespace"));
        }
    }
    Ok(())
}

fn validate_github(config: &Config) -> Result<()> {
    for (field, value) in [
        ("github.api_url", &config.github.api_url),
        ("github.web_url", &config.github.web_url),
    ] {
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid(field, "must be an http or https URL")),
            Err(e) => return Err(invalid(field, format!("invalid URL: {}", e))),
        }
    }

    if let Some(owner) = &config.github.owner {
        if owner.trim().is_empty() {
            return Err(invalid("github.owner", "owner cannot be empty"));
        }
    }
    Ok(())
}

fn validate_git(config: &Config) -> Result<()> {
    if config.git.remote.is_empty() {
        return Err(invalid("git.remote", "remote cannot be empty"));
    }

    if config.git.branch.is_empty() {
        return Err(invalid("git.branch", "branch cannot be empty"));
    }

    if config.git.commit_message.trim().is_empty() {
        return Err(invalid("git.commit_message", "commit message cannot be empty"));
    }

    Ok(())
}

fn validate_workflow(config: &Config) -> Result<()> {
    if config.workflow.branches.is_empty() {
        return Err(invalid("workflow.branches", "at least one branch is required"));
    }

    if config.workflow.gradle_task.trim().is_empty() {
        return Err(invalid("workflow.gradle_task", "gradle task cannot be empty"));
    }

    if config.workflow.file.is_absolute() {
        return Err(invalid(
            "workflow.file",
            "must be relative to the project root",
        ));
    }

    Ok(())
}

fn validate_monitor(config: &Config) -> Result<()> {
    let monitor = &config.monitor;
    if monitor.poll_interval_secs == 0 {
        return Err(invalid("monitor.poll_interval_secs", "must be at least 1"));
    }

    if monitor.max_attempts == 0 {
        return Err(invalid("monitor.max_attempts", "must be at least 1"));
    }

    if monitor.request_timeout_secs == 0 {
        return Err(invalid("monitor.request_timeout_secs", "must be at least 1"));
    }

    if monitor.artifact_name.trim().is_empty() {
        return Err(invalid("monitor.artifact_name", "artifact name cannot be empty"));
    }

    if !monitor.artifact_suffix.starts_with('.') || monitor.artifact_suffix.len() < 2 {
        return Err(invalid(
            "monitor.artifact_suffix",
            "must start with '.', e.g. \".apk\"",
        ));
    }

    // Artifacts are merged into this directory, so it must be a dedicated subdirectory
    let components: Vec<Component<'_>> = monitor.output_dir.components().collect();
    if components.iter().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid("monitor.output_dir", "must not contain '..'"));
    }
    if !components.iter().any(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid(
            "monitor.output_dir",
            "must name a subdirectory, not the project root",
        ));
    }

    Ok(())
}
