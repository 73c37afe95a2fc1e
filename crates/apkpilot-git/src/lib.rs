//! apkpilot Git - local repository operations for apkpilot
//!
//! This crate prepares a project for its first push: repository
//! initialization, commit identity, staging and committing, remote setup,
//! and pushing through the git CLI with a one-shot token header.

mod commits;
mod push;
mod remote;
mod repository;
mod status;
pub mod types;

pub use push::{git_push, remove_git_dir, PushFailure, PushOptions};
pub use repository::{GitRepo, Result};
pub use types::CommitInfo;
