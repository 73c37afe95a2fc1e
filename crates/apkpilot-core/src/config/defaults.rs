//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "apkpilot.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "apkpilot.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".apkpilot.toml",
        ".apkpilot.yaml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    serde_yaml::to_string(&Config::default()).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template (TOML)
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# apkpilot configuration
# Every key is optional; the values below are the defaults.

# Repository name (defaults to the project directory name)
# name = "my-app"

[github]
api_url = "https://api.github.com"
web_url = "https://github.com"
# owner = "octocat"

[repository]
private = false
# description = "Android APK build for my-app"

[git]
remote = "origin"
branch = "main"
force_push = false
commit_message = "Initial commit - APK build setup {timestamp}"

[workflow]
name = "Android CI Build"
file = ".github/workflows/build.yml"
branches = ["main", "master", "develop"]
java_version = "17"
java_distribution = "temurin"
gradle_task = "assembleDebug"
artifact_path = "app/build/outputs/apk/debug/app-debug.apk"

[monitor]
poll_interval_secs = 10
max_attempts = 60
artifact_name = "app-debug"
artifact_suffix = ".apk"
output_dir = "build-artifacts"
request_timeout_secs = 30
match_commit = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_default_yaml_round_trips() {
        let parsed: Config = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
