//! Init command

use clap::Args;
use console::style;
use dialoguer::{Confirm, Select};
use tracing::info;

use apkpilot_core::config::{write_default_config, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};

use crate::cli::Cli;

/// Initialize a new apkpilot configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Use defaults without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Write YAML instead of TOML
    #[arg(long)]
    pub yaml: bool,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, yes = self.yes, "executing init command");
        let cwd = std::env::current_dir()?;

        // Choose format if not specified
        let file_name = if self.yes || self.yaml {
            if self.yaml {
                DEFAULT_CONFIG_YAML
            } else {
                DEFAULT_CONFIG_TOML
            }
        } else {
            let formats = [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML];
            let selection = Select::new()
                .with_prompt("Configuration format")
                .items(&formats)
                .default(0)
                .interact()?;
            formats[selection]
        };

        let config_path = cwd.join(file_name);
        let mut force = self.force;

        // Check if config already exists
        if config_path.exists() && !force {
            if self.yes {
                anyhow::bail!(
                    "Configuration file already exists at {}. Use --force to overwrite.",
                    config_path.display()
                );
            }

            let overwrite = Confirm::new()
                .with_prompt(format!(
                    "Configuration file already exists at {}. Overwrite?",
                    config_path.display()
                ))
                .default(false)
                .interact()?;

            if !overwrite {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
            force = true;
        }

        let config_path = write_default_config(&cwd, file_name, force)?;

        if !cli.quiet {
            println!(
                "{} Created configuration at {}",
                style("✓").green().bold(),
                style(config_path.display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!("  1. Edit {} to customize the build", config_path.display());
            println!("  2. Run {} to store your GitHub token", style("apkpilot setup").cyan());
            println!("  3. Run {} to push and build the APK", style("apkpilot build").cyan());
        }

        Ok(())
    }
}
