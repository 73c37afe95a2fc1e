//! Workflow command

use clap::Args;
use console::style;
use tracing::info;

use apkpilot_core::config::{load_config_or_default, validate_config, Config};
use apkpilot_core::templates::gitignore_entries;
use apkpilot_core::{
    ensure_gitignore, is_android_project, AndroidWorkflowTemplate, CITemplate, TemplateOptions,
};

use crate::cli::output;
use crate::cli::Cli;

/// Write the Actions workflow and .gitignore entries
#[derive(Debug, Args)]
pub struct WorkflowCommand {
    /// Print the workflow instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Gradle task to run (overrides configuration)
    #[arg(long)]
    pub gradle_task: Option<String>,
}

/// Write the workflow file and append missing .gitignore entries
pub(crate) fn write_project_files(
    dir: &std::path::Path,
    config: &Config,
    options: &TemplateOptions,
    cli: &Cli,
) -> anyhow::Result<()> {
    let template = AndroidWorkflowTemplate::new();
    let path = template.write_to(dir, options)?;
    if cli.is_interactive_text() {
        output::success(&format!(
            "Wrote {} workflow to {}",
            template.platform_name(),
            output::path_style().apply_to(path.display())
        ));
    }

    let added = ensure_gitignore(dir, &gitignore_entries(config))?;
    if cli.is_interactive_text() && !added.is_empty() {
        output::success(&format!("Added {} entries to .gitignore", added.len()));
    }

    Ok(())
}

impl WorkflowCommand {
    /// Execute the workflow command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing workflow command");
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;
        validate_config(&config)?;

        let mut options = TemplateOptions::from_config(&config);
        if let Some(task) = &self.gradle_task {
            options = options.with_gradle_task(task);
        }

        if !is_android_project(&cwd) && !cli.quiet {
            output::warning(
                "No Gradle build files found; this does not look like an Android project",
            );
        }

        let template = AndroidWorkflowTemplate::new();
        if self.dry_run {
            let content = template.generate(&options)?;
            if !cli.quiet {
                println!(
                    "{} {}",
                    style("Would write").yellow().bold(),
                    template.config_path(&options).display()
                );
                println!();
            }
            println!("{}", content);
            return Ok(());
        }

        write_project_files(&cwd, &config, &options, cli)
    }
}
