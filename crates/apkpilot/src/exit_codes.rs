//! Exit codes for the CLI

#![allow(dead_code)]

use std::fmt;

use apkpilot_actions::MonitorOutcome;
use apkpilot_core::{ApkPilotError, ConfigError, CredentialsError, GitError};

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Git error
pub const GIT_ERROR: i32 = 3;

/// The remote build finished without success
pub const BUILD_FAILED: i32 = 4;

/// The remote build did not finish within the attempt ceiling
pub const TIMED_OUT: i32 = 5;

/// The build succeeded but its artifact could not be retrieved
pub const ARTIFACT_FAILED: i32 = 6;

/// User cancelled
pub const CANCELLED: i32 = 130;

/// A non-zero exit whose cause was already shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported(pub i32);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exited with status {}", self.0)
    }
}

impl std::error::Error for Reported {}

/// Turn an exit code into a result, failing silently when non-zero
pub fn check(code: i32) -> anyhow::Result<()> {
    if code == SUCCESS {
        Ok(())
    } else {
        Err(Reported(code).into())
    }
}

/// Exit code reported for a monitor outcome
pub fn for_outcome(outcome: &MonitorOutcome) -> i32 {
    match outcome {
        MonitorOutcome::Succeeded { .. } => SUCCESS,
        MonitorOutcome::Failed { .. } => BUILD_FAILED,
        MonitorOutcome::TimedOut { .. } => TIMED_OUT,
        MonitorOutcome::ArtifactRetrievalFailed { .. } => ARTIFACT_FAILED,
        MonitorOutcome::Cancelled { .. } => CANCELLED,
    }
}

/// Exit code reported for a command error
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(Reported(code)) = err.downcast_ref::<Reported>() {
        return *code;
    }
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ApkPilotError>() {
            match e {
                ApkPilotError::Config(_) | ApkPilotError::Credentials(_) => return CONFIG_ERROR,
                ApkPilotError::Git(_) => return GIT_ERROR,
                _ => {}
            }
        }
        if cause.is::<ConfigError>() || cause.is::<CredentialsError>() {
            return CONFIG_ERROR;
        }
        if cause.is::<GitError>() {
            return GIT_ERROR;
        }
    }
    ERROR
}
