//! `.gitignore` maintenance

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

/// Patterns every pushed Android project should ignore
pub const DEFAULT_GITIGNORE_ENTRIES: &[&str] = &[
    // Android Studio and Gradle
    "*.iml",
    ".gradle",
    "/local.properties",
    "/.idea/caches",
    "/.idea/libraries",
    "/.idea/modules.xml",
    "/.idea/workspace.xml",
    "/.idea/navEditor.xml",
    "/.idea/assetWizardSettings.xml",
    ".DS_Store",
    "/build",
    "/captures",
    ".externalNativeBuild",
    ".cxx",
    "local.properties",
    // Build outputs
    "*.apk",
    "*.aab",
    // Signing keys
    "*.jks",
    "*.keystore",
];

const SECTION_HEADER: &str = "# Added by apkpilot";

/// Default entries plus the configured artifact output directory
pub fn gitignore_entries(config: &Config) -> Vec<String> {
    let mut entries: Vec<String> = DEFAULT_GITIGNORE_ENTRIES
        .iter()
        .map(|e| e.to_string())
        .collect();

    let output_dir = config.monitor.output_dir.to_string_lossy();
    let output_dir = output_dir.trim_end_matches('/');
    if !output_dir.is_empty() && !config.monitor.output_dir.is_absolute() {
        entries.push(format!("/{}/", output_dir.trim_start_matches("./")));
    }
    entries
}

/// Append the entries missing from `<dir>/.gitignore`.
///
/// Existing content is preserved. Returns the entries that were added.
pub fn ensure_gitignore<S: AsRef<str>>(dir: &Path, entries: &[S]) -> Result<Vec<String>> {
    let path = dir.join(".gitignore");
    let existing = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        String::new()
    };

    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    let mut missing: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.as_ref().trim();
        if entry.is_empty() || present.contains(&entry) || missing.iter().any(|m| m == entry) {
            continue;
        }
        missing.push(entry.to_string());
    }

    if missing.is_empty() {
        debug!(path = %path.display(), "gitignore already up to date");
        return Ok(missing);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(SECTION_HEADER);
    content.push('\n');
    for entry in &missing {
        content.push_str(entry);
        content.push('\n');
    }

    fs::write(&path, content)?;
    info!(path = %path.display(), added = missing.len(), "updated gitignore");
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_gitignore() {
        let temp = TempDir::new().unwrap();
        let added = ensure_gitignore(temp.path(), DEFAULT_GITIGNORE_ENTRIES).unwrap();
        assert_eq!(added.len(), DEFAULT_GITIGNORE_ENTRIES.len());

        let content = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert!(content.starts_with(SECTION_HEADER));
        assert!(content.contains("*.keystore\n"));
    }

    #[test]
    fn test_appends_only_missing_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".gitignore");
        fs::write(&path, "node_modules\n*.apk").unwrap();

        let added = ensure_gitignore(temp.path(), &["*.apk", "*.aab"]).unwrap();
        assert_eq!(added, vec!["*.aab".to_string()]);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("node_modules\n*.apk\n"));
        assert_eq!(content.matches("*.apk").count(), 1);
        assert!(content.ends_with("*.aab\n"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let temp = TempDir::new().unwrap();
        ensure_gitignore(temp.path(), DEFAULT_GITIGNORE_ENTRIES).unwrap();
        let before = fs::read_to_string(temp.path().join(".gitignore")).unwrap();

        let added = ensure_gitignore(temp.path(), DEFAULT_GITIGNORE_ENTRIES).unwrap();
        assert!(added.is_empty());
        assert_eq!(before, fs::read_to_string(temp.path().join(".gitignore")).unwrap());
    }

    #[test]
    fn test_entries_include_output_dir() {
        let entries = gitignore_entries(&Config::default());
        assert!(entries.contains(&"/build-artifacts/".to_string()));
    }
}
