//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml")
    {
        "YAML"
    } else {
        "TOML"
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
///   1. `<dir>/<name>`          (e.g. `xcversion.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/xcversion.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
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

    let mut config = load_config(&config_path)?;

    // Relative project paths are anchored at the config file, not the cwd
    if let (Some(project), Some(base)) = (&config.project.path, config_path.parent()) {
        if project.is_relative() {
            let base = if base.ends_with(".github") {
                base.parent().unwrap_or(base)
            } else {
                base
            };
            config.project.path = Some(base.join(project));
        }
    }

    Ok((config, config_path))
}

/// Load configuration or use defaults.
///
/// A config file that exists but fails to parse or validate is still an
/// error; only a missing file falls back to defaults.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match load_config_from_dir(dir) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(crate::error::XcversionError::Config(ConfigError::NotFound(_))) => {
            warn!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BaselinePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("xcversion.toml");
        std::fs::write(&config_path, "[versioning]\nomit_zero_patch = true").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".xcversion.yaml");
        std::fs::write(&config_path, "versioning:\n  omit_zero_patch: true\n").unwrap();
        let nested = temp.path().join("ios").join("App");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config(&nested);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("xcversion.toml");
        std::fs::write(&config_path, "").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("xcversion.yaml");
        std::fs::write(
            &config_path,
            "versioning:\n  baseline: highest\nappstore:\n  country: de\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.versioning.baseline, BaselinePolicy::Highest);
        assert_eq!(config.appstore.country.as_deref(), Some("de"));
        assert_eq!(config.appstore.platform, "ios");
    }

    #[test]
    fn test_project_path_relative_to_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("xcversion.toml"),
            "[project]\npath = \"ios/App.xcodeproj\"\n",
        )
        .unwrap();

        let (config, _) = load_config_from_dir(temp.path()).unwrap();
        assert_eq!(
            config.project.path,
            Some(temp.path().join("ios/App.xcodeproj"))
        );
    }

    #[test]
    fn test_invalid_config_is_not_replaced_by_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("xcversion.toml"),
            "[appstore]\nplatform = \"tvos\"\n",
        )
        .unwrap();

        assert!(load_config_or_default(temp.path()).is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config, Config::default());
    }
}
