//! Watch command

use clap::Args;
use tracing::info;

use apkpilot_actions::{MonitorSession, RepoId};
use apkpilot_core::config::{load_config_or_default, validate_config, Config};
use apkpilot_core::Credentials;

use crate::cli::commands::monitor::run_monitor;
use crate::cli::commands::setup::load_credentials;
use crate::cli::Cli;
use crate::exit_codes;

/// Monitor the latest build of a repository
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Repository as owner/name (default: configured owner and project name)
    #[arg(long)]
    pub repo: Option<String>,

    /// Only follow the run for this commit
    #[arg(long)]
    pub sha: Option<String>,
}

impl WatchCommand {
    /// Execute the watch command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(repo = ?self.repo, sha = ?self.sha, "executing watch command");
        let runtime = tokio::runtime::Runtime::new()?;
        let code = runtime.block_on(self.execute_async(cli))?;
        exit_codes::check(code)
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<i32> {
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;
        validate_config(&config)?;

        let credentials = load_credentials()?;
        let token = credentials.token().ok_or_else(|| {
            anyhow::anyhow!("No GitHub token stored. Run `apkpilot setup` first.")
        })?;

        let repo = self.target_repo(&config, &credentials, &cwd)?;
        let mut session = MonitorSession::new(repo);
        if let Some(sha) = &self.sha {
            session = session.with_head_sha(sha.trim());
        }

        run_monitor(cli, &config, token, session).await
    }

    /// Repository from `--repo`, else owner and name from config and credentials
    fn target_repo(
        &self,
        config: &Config,
        credentials: &Credentials,
        cwd: &std::path::Path,
    ) -> anyhow::Result<RepoId> {
        if let Some(full_name) = &self.repo {
            return RepoId::parse(full_name).ok_or_else(|| {
                anyhow::anyhow!("Invalid repository '{}', expected owner/name", full_name)
            });
        }

        let owner = config
            .github
            .owner
            .as_deref()
            .or(credentials.username())
            .ok_or_else(|| anyhow::anyhow!("No repository owner known; pass --repo owner/name"))?;
        let name = config
            .repository_name(cwd)
            .ok_or_else(|| anyhow::anyhow!("No repository name known; pass --repo owner/name"))?;
        Ok(RepoId::new(owner, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn command(repo: Option<&str>) -> WatchCommand {
        WatchCommand {
            repo: repo.map(|r| r.to_string()),
            sha: None,
        }
    }

    #[test]
    fn test_target_repo_from_flag() {
        let repo = command(Some("octocat/my-app"))
            .target_repo(&Config::default(), &Credentials::default(), Path::new("/tmp/x"))
            .unwrap();
        assert_eq!(repo, RepoId::new("octocat", "my-app"));
    }

    #[test]
    fn test_target_repo_rejects_malformed_flag() {
        let result = command(Some("just-a-name")).target_repo(
            &Config::default(),
            &Credentials::default(),
            Path::new("/tmp/x"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_target_repo_from_config() {
        let credentials = Credentials::new("ghp_test", "octocat", "octo@example.com");
        let repo = command(None)
            .target_repo(&Config::default(), &credentials, Path::new("/work/my-app"))
            .unwrap();
        assert_eq!(repo.full_name(), "octocat/my-app");
    }
}
