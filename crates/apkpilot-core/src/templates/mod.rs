//! Project file templates
//!
//! Provides:
//! - the GitHub Actions workflow that builds the APK
//! - `.gitignore` maintenance for Android projects
//! - Android project detection

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::Result;

mod android;
mod gitignore;

pub use android::AndroidWorkflowTemplate;
pub use gitignore::{ensure_gitignore, gitignore_entries, DEFAULT_GITIGNORE_ENTRIES};

/// Template generation options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Workflow display name
    pub workflow_name: String,
    /// Workflow file path relative to the project root
    pub workflow_file: PathBuf,
    /// Branches that trigger a build
    pub branches: Vec<String>,
    /// JDK version
    pub java_version: String,
    /// JDK distribution
    pub java_distribution: String,
    /// Gradle task to run
    pub gradle_task: String,
    /// Name the APK is uploaded under
    pub artifact_name: String,
    /// Path of the built APK in the runner workspace
    pub artifact_path: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl TemplateOptions {
    /// Create template options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Options matching a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            workflow_name: config.workflow.name.clone(),
            workflow_file: config.workflow.file.clone(),
            branches: config.workflow.branches.clone(),
            java_version: config.workflow.java_version.clone(),
            java_distribution: config.workflow.java_distribution.clone(),
            gradle_task: config.workflow.gradle_task.clone(),
            artifact_name: config.monitor.artifact_name.clone(),
            artifact_path: config.workflow.artifact_path.clone(),
        }
    }

    /// Set the triggering branches
    pub fn with_branches(mut self, branches: Vec<String>) -> Self {
        self.branches = branches;
        self
    }

    /// Set the Gradle task
    pub fn with_gradle_task(mut self, task: impl Into<String>) -> Self {
        self.gradle_task = task.into();
        self
    }

    /// Set the uploaded artifact name and path
    pub fn with_artifact(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.artifact_name = name.into();
        self.artifact_path = path.into();
        self
    }
}

/// CI configuration generator
pub trait CITemplate: Send + Sync {
    /// Get the CI platform name
    fn platform_name(&self) -> &'static str;

    /// Get the configuration file path (relative to repo root)
    fn config_path(&self, options: &TemplateOptions) -> PathBuf;

    /// Generate the template content
    fn generate(&self, options: &TemplateOptions) -> Result<String>;

    /// Write the template to a file, returning the written path
    fn write_to(&self, base_dir: &Path, options: &TemplateOptions) -> Result<PathBuf> {
        let content = self.generate(options)?;
        let path = base_dir.join(self.config_path(options));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, content)?;
        info!(platform = self.platform_name(), path = %path.display(), "wrote CI template");
        Ok(path)
    }
}

/// Gradle build files that mark an Android project root
const ANDROID_MARKERS: &[&str] = &[
    "app/build.gradle",
    "app/build.gradle.kts",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
];

/// Whether `path` looks like the root of an Android (Gradle) project
pub fn is_android_project(path: &Path) -> bool {
    ANDROID_MARKERS.iter().any(|marker| path.join(marker).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_options_defaults() {
        let opts = TemplateOptions::new();
        assert_eq!(opts.gradle_task, "assembleDebug");
        assert_eq!(opts.artifact_name, "app-debug");
        assert_eq!(opts.branches, vec!["main", "master", "develop"]);
    }

    #[test]
    fn test_template_options_follow_config() {
        let mut config = Config::default();
        config.monitor.artifact_name = "app-release".to_string();
        config.workflow.gradle_task = "assembleRelease".to_string();

        let opts = TemplateOptions::from_config(&config);
        assert_eq!(opts.artifact_name, "app-release");
        assert_eq!(opts.gradle_task, "assembleRelease");
    }

    #[test]
    fn test_detect_android_project() {
        let temp = TempDir::new().unwrap();
        assert!(!is_android_project(temp.path()));

        std::fs::create_dir_all(temp.path().join("app")).unwrap();
        std::fs::write(temp.path().join("app/build.gradle.kts"), "").unwrap();
        assert!(is_android_project(temp.path()));
    }

    #[test]
    fn test_detect_settings_gradle() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("settings.gradle"), "").unwrap();
        assert!(is_android_project(temp.path()));
    }
}
