//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ApkPilotError, ConfigError, Result};

use super::defaults::{config_file_names, default_config_yaml, DEFAULT_CONFIG_TEMPLATE};
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `apkpilot.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/apkpilot.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.is_file() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration, falling back to defaults when no file exists.
///
/// A file that exists but fails to parse or validate is still an error.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match load_config_from_dir(dir) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(ApkPilotError::Config(ConfigError::NotFound(_))) => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}

/// Write a default configuration file into `dir`.
///
/// The format follows the file extension of `file_name`. Existing files are
/// only replaced when `force` is set.
pub fn write_default_config(dir: &Path, file_name: &str, force: bool) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path).into());
    }

    let content = if file_name.ends_with(".toml") {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    } else {
        default_config_yaml()
    };

    std::fs::write(&path, content).map_err(ConfigError::Io)?;
    info!(path = %path.display(), "wrote default config");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("apkpilot.toml");
        std::fs::write(&config_path, "[git]\nbranch = \"main\"").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("apkpilot.toml");
        let yaml_path = temp.path().join("apkpilot.yaml");
        std::fs::write(&toml_path, "[git]\nbranch = \"main\"").unwrap();
        std::fs::write(&yaml_path, "git:\n  branch: main").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, toml_path);
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("apkpilot.yaml");
        std::fs::write(&config_path, "git:\n  branch: main").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".apkpilot.toml");
        std::fs::write(&config_path, "").unwrap();
        let nested = temp.path().join("app").join("src");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("apkpilot.toml");
        std::fs::write(
            &config_path,
            "name = \"my-app\"\n\n[monitor]\nmax_attempts = 5\npoll_interval_secs = 2\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.name.as_deref(), Some("my-app"));
        assert_eq!(config.monitor.max_attempts, 5);
        assert_eq!(config.monitor.poll_interval_secs, 2);
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("apkpilot.yaml");
        std::fs::write(
            &config_path,
            "repository:\n  private: true\nworkflow:\n  gradle_task: assembleRelease\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert!(config.repository.private);
        assert_eq!(config.workflow.gradle_task, "assembleRelease");
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_config_is_not_masked() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("apkpilot.toml"),
            "[monitor]\nmax_attempts = 0\n",
        )
        .unwrap();

        assert!(load_config_or_default(temp.path()).is_err());
    }

    #[test]
    fn test_write_default_config() {
        let temp = TempDir::new().unwrap();
        let path = write_default_config(temp.path(), "apkpilot.toml", false).unwrap();
        assert_eq!(load_config(&path).unwrap(), Config::default());

        let again = write_default_config(temp.path(), "apkpilot.toml", false);
        assert!(matches!(
            again,
            Err(ApkPilotError::Config(ConfigError::AlreadyExists(_)))
        ));
        assert!(write_default_config(temp.path(), "apkpilot.toml", true).is_ok());
    }
}
