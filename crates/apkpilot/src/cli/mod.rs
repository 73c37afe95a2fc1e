//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{
    BuildCommand, CleanCommand, CompletionsCommand, InitCommand, ResetCommand, SetupCommand,
    WatchCommand, WorkflowCommand,
};

/// apkpilot - build Android APKs on GitHub Actions
#[derive(Debug, Parser)]
#[command(name = "apkpilot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

impl Cli {
    /// Whether human-readable progress should be printed
    pub fn is_interactive_text(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store and verify GitHub credentials
    Setup(SetupCommand),

    /// Delete stored credentials
    Reset(ResetCommand),

    /// Remove the local git repository of the project
    Clean(CleanCommand),

    /// Initialize a new apkpilot configuration
    Init(InitCommand),

    /// Write the Actions workflow and .gitignore entries
    Workflow(WorkflowCommand),

    /// Push the project, build it on GitHub Actions and fetch the APK
    Build(BuildCommand),

    /// Monitor the latest build of a repository
    Watch(WatchCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Setup(ref cmd) => cmd.execute(&self),
            Commands::Reset(ref cmd) => cmd.execute(&self),
            Commands::Clean(ref cmd) => cmd.execute(&self),
            Commands::Init(ref cmd) => cmd.execute(&self),
            Commands::Workflow(ref cmd) => cmd.execute(&self),
            Commands::Build(ref cmd) => cmd.execute(&self),
            Commands::Watch(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }
}
