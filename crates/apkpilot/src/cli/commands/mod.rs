//! CLI commands

mod build;
mod clean;
mod completions;
mod init;
mod monitor;
mod reset;
mod setup;
mod watch;
mod workflow;

pub use build::BuildCommand;
pub use clean::CleanCommand;
pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use reset::ResetCommand;
pub use setup::SetupCommand;
pub use watch::WatchCommand;
pub use workflow::WorkflowCommand;
