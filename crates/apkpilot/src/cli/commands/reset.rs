//! Reset command

use clap::Args;
use tracing::info;

use apkpilot_core::CredentialStore;

use crate::cli::output;
use crate::cli::Cli;

/// Delete stored credentials
#[derive(Debug, Args)]
pub struct ResetCommand {}

impl ResetCommand {
    /// Execute the reset command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing reset command");
        let store = CredentialStore::default_location()?;
        let removed = store.reset()?;

        if !cli.quiet {
            if removed {
                output::success(&format!(
                    "Removed stored credentials at {}",
                    output::path_style().apply_to(store.path().display())
                ));
            } else {
                output::info("No stored credentials to remove");
            }
        }

        Ok(())
    }
}
