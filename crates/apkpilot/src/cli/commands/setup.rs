//! Setup command

use clap::Args;
use console::style;
use dialoguer::{Input, Password};
use tracing::info;

use apkpilot_actions::account::REQUIRED_SCOPES;
use apkpilot_core::config::load_config_or_default;
use apkpilot_core::{CredentialStore, Credentials};

use crate::cli::commands::monitor::actions_client;
use crate::cli::output;
use crate::cli::Cli;

/// Store and verify GitHub credentials
#[derive(Debug, Args)]
pub struct SetupCommand {
    /// Prompt for every value, even ones already stored
    #[arg(long)]
    pub reconfigure: bool,

    /// GitHub username (prompted when missing)
    #[arg(long)]
    pub username: Option<String>,

    /// Email used for commits (prompted when missing)
    #[arg(long)]
    pub email: Option<String>,
}

/// Stored credentials with environment overrides applied
pub(crate) fn load_credentials() -> anyhow::Result<Credentials> {
    let store = CredentialStore::default_location()?;
    Ok(store.load()?.with_env_overrides())
}

/// Credentials that must be complete, with a hint pointing at `setup`
pub(crate) fn require_credentials() -> anyhow::Result<Credentials> {
    let credentials = load_credentials()?;
    if let Err(e) = credentials.require_complete() {
        anyhow::bail!("{}. Run `apkpilot setup` first.", e);
    }
    Ok(credentials)
}

impl SetupCommand {
    /// Execute the setup command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(reconfigure = self.reconfigure, "executing setup command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;
        let store = CredentialStore::default_location()?;
        let stored = store.load()?;

        let token = match stored.token() {
            Some(token) if !self.reconfigure => token.to_string(),
            _ => Password::new()
                .with_prompt("GitHub personal access token")
                .interact()?,
        };

        let client = actions_client(&config, &token)?;
        let identity = client.verify_credentials().await?;
        if cli.is_interactive_text() {
            output::success(&format!(
                "Token accepted for {}",
                style(&identity.login).bold()
            ));
        }

        let missing = identity.missing_scopes(REQUIRED_SCOPES);
        if !missing.is_empty() {
            output::warning(&format!(
                "Token is missing the {} scope(s); creating repositories or pushing workflows may fail",
                missing.join(", ")
            ));
        }

        let username = match (&self.username, stored.username()) {
            (Some(username), _) => username.clone(),
            (None, Some(username)) if !self.reconfigure => username.to_string(),
            (None, current) => Input::<String>::new()
                .with_prompt("GitHub username")
                .default(current.unwrap_or(identity.login.as_str()).to_string())
                .interact_text()?,
        };

        let email = match (&self.email, stored.email()) {
            (Some(email), _) => email.clone(),
            (None, Some(email)) if !self.reconfigure => email.to_string(),
            (None, current) => {
                let mut prompt = Input::<String>::new().with_prompt("Email for commits");
                if let Some(current) = current {
                    prompt = prompt.default(current.to_string());
                }
                prompt
                    .validate_with(|input: &String| -> Result<(), &str> {
                        if input.contains('@') {
                            Ok(())
                        } else {
                            Err("not an email address")
                        }
                    })
                    .interact_text()?
            }
        };

        let credentials = Credentials::new(token, username, email);
        credentials.require_complete()?;
        store.save(&credentials)?;

        if !cli.quiet {
            output::success(&format!(
                "Saved credentials to {}",
                output::path_style().apply_to(store.path().display())
            ));
        }

        Ok(())
    }
}
