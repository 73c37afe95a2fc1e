//! Build command

use clap::Args;
use console::style;
use dialoguer::{Confirm, Input};
use tracing::{info, instrument};

use apkpilot_actions::{CreateRepository, MonitorSession, RepoId, RepositoryCreation};
use apkpilot_core::config::{load_config_or_default, validate_config, Config};
use apkpilot_core::{is_android_project, Credentials, TemplateOptions};
use apkpilot_git::{git_push, GitRepo, PushOptions};

use crate::cli::commands::monitor::{actions_client, run_monitor};
use crate::cli::commands::setup::require_credentials;
use crate::cli::commands::workflow::write_project_files;
use crate::cli::output;
use crate::cli::Cli;
use crate::exit_codes;

/// Push the project, build it on GitHub Actions and fetch the APK
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Repository name on GitHub (default: configured name or directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Overwrite the remote branch when histories diverge
    #[arg(long)]
    pub force_push: bool,

    /// Create the repository as private
    #[arg(long)]
    pub private: bool,

    /// Accept defaults without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Stop after pushing instead of waiting for the build
    #[arg(long)]
    pub no_watch: bool,
}

/// Everything resolved before the first side effect
struct BuildPlan {
    config: Config,
    credentials: Credentials,
    owner: String,
    name: String,
    force_push: bool,
    private: bool,
}

/// Repository owner: configured owner, else the stored username
fn resolve_owner(config: &Config, credentials: &Credentials) -> Option<String> {
    config
        .github
        .owner
        .clone()
        .filter(|owner| !owner.trim().is_empty())
        .or_else(|| credentials.username().map(|u| u.to_string()))
}

/// Organization to create the repository in, when the owner is not the token's user
fn organization_for(owner: &str, login: &str) -> Option<String> {
    (!owner.eq_ignore_ascii_case(login)).then(|| owner.to_string())
}

impl BuildCommand {
    /// Execute the build command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            name = ?self.name,
            force_push = self.force_push,
            no_watch = self.no_watch,
            "executing build command"
        );

        let Some(plan) = self.plan()? else {
            println!("{}", style("Aborted.").yellow());
            return Ok(());
        };

        // Run async operation in tokio runtime
        let runtime = tokio::runtime::Runtime::new()?;
        let code = runtime.block_on(self.execute_async(cli, plan))?;
        exit_codes::check(code)
    }

    /// Load configuration and credentials and ask the interactive questions.
    ///
    /// Returns `None` when the user declines to continue.
    fn plan(&self) -> anyhow::Result<Option<BuildPlan>> {
        let cwd = std::env::current_dir()?;
        let (config, config_path) = load_config_or_default(&cwd)?;
        validate_config(&config)?;
        if let Some(path) = &config_path {
            info!(path = %path.display(), "using configuration");
        }

        let credentials = require_credentials()?;
        let owner = resolve_owner(&config, &credentials).ok_or_else(|| {
            anyhow::anyhow!("No GitHub owner configured. Run `apkpilot setup` first.")
        })?;

        let default_name = config.repository_name(&cwd).ok_or_else(|| {
            anyhow::anyhow!("Cannot derive a repository name from {}", cwd.display())
        })?;
        let name = match &self.name {
            Some(name) => name.clone(),
            None if self.yes => default_name,
            None => Input::<String>::new()
                .with_prompt("Repository name")
                .default(default_name)
                .interact_text()?,
        };
        if name.trim().is_empty() || name.contains('/') {
            anyhow::bail!("Invalid repository name: '{}'", name);
        }

        if !is_android_project(&cwd) {
            output::warning(
                "No Gradle build files found; this does not look like an Android project",
            );
            if !self.yes {
                let proceed = Confirm::new()
                    .with_prompt("Continue anyway?")
                    .default(false)
                    .interact()?;
                if !proceed {
                    return Ok(None);
                }
            }
        }

        Ok(Some(BuildPlan {
            force_push: self.force_push || config.git.force_push,
            private: self.private || config.repository.private,
            config,
            credentials,
            owner,
            name,
        }))
    }

    #[instrument(skip_all, fields(owner = %plan.owner, name = %plan.name))]
    async fn execute_async(&self, cli: &Cli, plan: BuildPlan) -> anyhow::Result<i32> {
        let cwd = std::env::current_dir()?;
        let config = &plan.config;
        let token = plan.credentials.token().ok_or_else(|| {
            anyhow::anyhow!("No GitHub token stored. Run `apkpilot setup` first.")
        })?;
        let text = cli.is_interactive_text();

        if text {
            println!();
            println!("{}", output::header("Building APK on GitHub Actions"));
            println!(
                "{}",
                output::key_value("Repository", &format!("{}/{}", plan.owner, plan.name))
            );
            println!("{}", output::key_value("Branch", &config.git.branch));
            if plan.force_push {
                println!("  {}", style("FORCE PUSH").yellow().bold());
            }
            println!();
        }

        // Remote repository
        let client = actions_client(config, token)?;
        let description = config
            .repository
            .description
            .clone()
            .unwrap_or_else(|| format!("Android APK build for {}", plan.name));
        let mut request = CreateRepository::new(&plan.name)
            .with_description(description)
            .private(plan.private);
        let identity = client.verify_credentials().await?;
        if let Some(org) = organization_for(&plan.owner, &identity.login) {
            info!(
                organization = %org,
                login = %identity.login,
                "creating repository in organization"
            );
            request = request.in_organization(org);
        }
        match client.create_repository(&request).await? {
            RepositoryCreation::Created if text => output::success("Created GitHub repository"),
            RepositoryCreation::AlreadyExists if text => {
                output::info("GitHub repository already exists; reusing it")
            }
            _ => {}
        }

        // Local repository
        let (repo, created) = GitRepo::open_or_init(&cwd, &config.git.branch)?;
        if created && text {
            output::success("Initialized git repository");
        }
        if let (Some(username), Some(email)) =
            (plan.credentials.username(), plan.credentials.email())
        {
            repo.set_identity(username, email)?;
        }

        write_project_files(&cwd, config, &TemplateOptions::from_config(config), cli)?;

        repo.rename_current_branch(&config.git.branch)?;
        let message = config.git.render_commit_message(chrono::Local::now());
        match repo.commit_all(&message)? {
            Some(commit) if text => output::success(&format!(
                "Committed {} ({})",
                commit.short_hash, commit.message
            )),
            None if text => output::info("Nothing new to commit"),
            _ => {}
        }

        let clone_url = config.github.clone_url(&plan.owner, &plan.name);
        repo.set_remote(&config.git.remote, &clone_url)?;

        let push = PushOptions::new(repo.path(), &config.git.remote, &config.git.branch)
            .with_force(plan.force_push)
            .with_auth_token(token);
        git_push(&push)?;
        let head_sha = repo.head_sha()?;
        if text {
            output::success(&format!("Pushed to {}", clone_url));
            output::info(&format!(
                "Build status: {}",
                config.github.actions_url(&plan.owner, &plan.name)
            ));
        }

        if self.no_watch {
            return Ok(exit_codes::SUCCESS);
        }

        let mut session = MonitorSession::new(RepoId::new(&plan.owner, &plan.name));
        if config.monitor.match_commit {
            session = session.with_head_sha(head_sha);
        }
        run_monitor(cli, config, token, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_owner_prefers_config() {
        let credentials = Credentials::new("ghp_test", "octocat", "octo@example.com");
        let mut config = Config::default();
        assert_eq!(resolve_owner(&config, &credentials).as_deref(), Some("octocat"));

        config.github.owner = Some("android-org".to_string());
        assert_eq!(resolve_owner(&config, &credentials).as_deref(), Some("android-org"));

        config.github.owner = Some("  ".to_string());
        assert_eq!(resolve_owner(&config, &credentials).as_deref(), Some("octocat"));
    }

    #[test]
    fn test_resolve_owner_missing() {
        assert!(resolve_owner(&Config::default(), &Credentials::default()).is_none());
    }

    #[test]
    fn test_organization_only_for_other_owners() {
        assert_eq!(organization_for("octocat", "octocat"), None);
        assert_eq!(organization_for("OctoCat", "octocat"), None);
        assert_eq!(
            organization_for("android-org", "octocat"),
            Some("android-org".to_string())
        );
    }
}
