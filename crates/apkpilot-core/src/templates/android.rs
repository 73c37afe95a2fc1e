//! GitHub Actions workflow for Android builds

use std::path::PathBuf;

use crate::error::{Result, TemplateError};

use super::{CITemplate, TemplateOptions};

/// Renders a workflow that builds the APK with Gradle and uploads it
#[derive(Debug, Clone, Default)]
pub struct AndroidWorkflowTemplate;

impl AndroidWorkflowTemplate {
    /// Create a new template
    pub fn new() -> Self {
        Self
    }

    fn check(options: &TemplateOptions) -> Result<()> {
        let single_line = [
            ("workflow_name", &options.workflow_name),
            ("java_version", &options.java_version),
            ("java_distribution", &options.java_distribution),
            ("gradle_task", &options.gradle_task),
            ("artifact_name", &options.artifact_name),
            ("artifact_path", &options.artifact_path),
        ];
        for (option, value) in single_line {
            if value.trim().is_empty() {
                return Err(invalid(option, "cannot be empty"));
            }
            if value.contains('\n') || value.contains('\r') {
                return Err(invalid(option, "must be a single line"));
            }
        }

        if options.branches.is_empty() {
            return Err(invalid("branches", "at least one branch is required"));
        }
        if options
            .branches
            .iter()
            .any(|b| b.trim().is_empty() || b.contains([',', '[', ']', '\n']))
        {
            return Err(invalid("branches", "branch names must be plain names"));
        }

        Ok(())
    }
}

fn invalid(option: &str, message: &str) -> crate::error::ApkPilotError {
    TemplateError::InvalidOption {
        option: option.to_string(),
        message: message.to_string(),
    }
    .into()
}

impl CITemplate for AndroidWorkflowTemplate {
    fn platform_name(&self) -> &'static str {
        "GitHub Actions"
    }

    fn config_path(&self, options: &TemplateOptions) -> PathBuf {
        options.workflow_file.clone()
    }

    fn generate(&self, options: &TemplateOptions) -> Result<String> {
        Self::check(options)?;
        let branches = options.branches.join(", ");

        Ok(format!(
            r#"name: {name}

on:
  push:
    branches: [ {branches} ]
  pull_request:
    branches: [ {branches} ]
  workflow_dispatch:

jobs:
  build:
    runs-on: ubuntu-latest

    steps:
      - name: Checkout repository
        uses: actions/checkout@v4

      - name: Set up JDK {java}
        uses: actions/setup-java@v4
        with:
          java-version: '{java}'
          distribution: '{distribution}'

      - name: Grant execute permission for gradlew
        run: chmod +x ./gradlew

      - name: Build with Gradle
        run: ./gradlew {task}

      - name: Upload APK
        uses: actions/upload-artifact@v4
        with:
          name: {artifact}
          path: {path}
"#,
            name = options.workflow_name,
            branches = branches,
            java = options.java_version,
            distribution = options.java_distribution,
            task = options.gradle_task,
            artifact = options.artifact_name,
            path = options.artifact_path,
        ))
    }
}
