//! Clean command

use clap::Args;
use console::style;
use dialoguer::Confirm;
use tracing::info;

use apkpilot_git::remove_git_dir;

use crate::cli::output;
use crate::cli::Cli;

/// Remove the local git repository of the project
#[derive(Debug, Args)]
pub struct CleanCommand {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl CleanCommand {
    /// Execute the clean command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(yes = self.yes, "executing clean command");
        let cwd = std::env::current_dir()?;
        let git_dir = cwd.join(".git");

        if !git_dir.exists() {
            if !cli.quiet {
                output::info("No git repository found; nothing to clean");
            }
            return Ok(());
        }

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Delete {} and all local history?",
                    git_dir.display()
                ))
                .default(false)
                .interact()?;

            if !confirmed {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        remove_git_dir(&cwd)?;
        if !cli.quiet {
            output::success(&format!("Removed {}", git_dir.display()));
        }

        Ok(())
    }
}
