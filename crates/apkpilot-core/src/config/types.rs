//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for apkpilot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository name; defaults to the project directory name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// GitHub endpoints and ownership
    pub github: GitHubConfig,

    /// Remote repository settings
    pub repository: RepositoryConfig,

    /// Git configuration
    pub git: GitConfig,

    /// Generated workflow settings
    pub workflow: WorkflowConfig,

    /// Build monitoring settings
    pub monitor: MonitorConfig,
}

impl Config {
    /// Repository name from config, else the directory name
    pub fn repository_name(&self, project_dir: &std::path::Path) -> Option<String> {
        self.name.clone().or_else(|| {
            project_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
    }
}

/// GitHub configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,

    /// Web base URL used for clone and browse links
    pub web_url: String,

    /// Repository owner; defaults to the authenticated user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            web_url: "https://github.com".to_string(),
            owner: None,
        }
    }
}

impl GitHubConfig {
    /// HTTPS clone URL for a repository
    pub fn clone_url(&self, owner: &str, name: &str) -> String {
        format!("{}/{}/{}.git", self.web_url.trim_end_matches('/'), owner, name)
    }

    /// Browser URL of a repository's Actions tab
    pub fn actions_url(&self, owner: &str, name: &str) -> String {
        format!(
            "{}/{}/{}/actions",
            self.web_url.trim_end_matches('/'),
            owner,
            name
        )
    }
}

/// Remote repository configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Create the repository as private
    pub private: bool,

    /// Repository description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Git configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Remote name
    pub remote: String,

    /// Branch to push
    pub branch: String,

    /// Overwrite the remote branch when pushing
    pub force_push: bool,

    /// Commit message template; `{timestamp}` is replaced
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: "main".to_string(),
            force_push: false,
            commit_message: "Initial commit - APK build setup {timestamp}".to_string(),
        }
    }
}

impl GitConfig {
    /// Render the commit message for the given time
    pub fn render_commit_message(&self, now: chrono::DateTime<chrono::Local>) -> String {
        self.commit_message
            .replace("{timestamp}", &now.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Workflow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Workflow display name
    pub name: String,

    /// Workflow file path relative to the project root
    pub file: PathBuf,

    /// Branches that trigger a build
    pub branches: Vec<String>,

    /// JDK version
    pub java_version: String,

    /// JDK distribution for actions/setup-java
    pub java_distribution: String,

    /// Gradle task producing the APK
    pub gradle_task: String,

    /// Path of the built APK inside the runner workspace
    pub artifact_path: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            name: "Android CI Build".to_string(),
            file: PathBuf::from(".github/workflows/build.yml"),
            branches: vec![
                "main".to_string(),
                "master".to_string(),
                "develop".to_string(),
            ],
            java_version: "17".to_string(),
            java_distribution: "temurin".to_string(),
            gradle_task: "assembleDebug".to_string(),
            artifact_path: "app/build/outputs/apk/debug/app-debug.apk".to_string(),
        }
    }
}

/// Build monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between status checks
    pub poll_interval_secs: u64,

    /// Maximum number of status checks
    pub max_attempts: u32,

    /// Name of the uploaded artifact
    pub artifact_name: String,

    /// Suffix of the file to locate inside the artifact
    pub artifact_suffix: String,

    /// Where downloaded artifacts are extracted
    pub output_dir: PathBuf,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Track the run for the pushed commit rather than the newest run
    pub match_commit: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_attempts: 60,
            artifact_name: "app-debug".to_string(),
            artifact_suffix: ".apk".to_string(),
            output_dir: PathBuf::from("build-artifacts"),
            request_timeout_secs: 30,
            match_commit: true,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("monitor:\n  max_attempts: 5\n").unwrap();
        assert_eq!(config.monitor.max_attempts, 5);
        assert_eq!(config.monitor.poll_interval_secs, 10);
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.workflow.branches.len(), 3);
    }

    #[test]
    fn test_repository_name_falls_back_to_dir() {
        let config = Config::default();
        assert_eq!(
            config.repository_name(Path::new("/work/my-app")),
            Some("my-app".to_string())
        );

        let named = Config {
            name: Some("renamed".to_string()),
            ..Config::default()
        };
        assert_eq!(
            named.repository_name(Path::new("/work/my-app")),
            Some("renamed".to_string())
        );
    }

    #[test]
    fn test_commit_message_timestamp() {
        let now = chrono::Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            GitConfig::default().render_commit_message(now),
            "Initial commit - APK build setup 2024-03-01 12:30:00"
        );
    }

    #[test]
    fn test_github_urls() {
        let github = GitHubConfig::default();
        assert_eq!(
            github.clone_url("octocat", "my-app"),
            "https://github.com/octocat/my-app.git"
        );
        assert_eq!(
            github.actions_url("octocat", "my-app"),
            "https://github.com/octocat/my-app/actions"
        );
    }
}
