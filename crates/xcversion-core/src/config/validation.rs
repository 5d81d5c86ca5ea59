//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_project(config)?;
    validate_appstore(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_project(config: &Config) -> Result<()> {
    if let Some(path) = &config.project.path {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.ends_with(".xcodeproj") && name != "project.pbxproj" {
            return Err(ConfigError::InvalidValue {
                field: "project.path".to_string(),
                message: "must point to a .xcodeproj or project.pbxproj".to_string(),
            }
            .into());
        }
    }

    for (field, value) in [
        ("project.target", &config.project.target),
        ("project.configuration", &config.project.configuration),
        ("project.scheme", &config.project.scheme),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "cannot be empty".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_appstore(config: &Config) -> Result<()> {
    let valid_platforms = ["ios", "macos"];
    if !valid_platforms.contains(&config.appstore.platform.as_str()) {
        return Err(ConfigError::InvalidValue {
            field: "appstore.platform".to_string(),
            message: format!("must be one of: {}", valid_platforms.join(", ")),
        }
        .into());
    }

    if let Some(country) = &config.appstore.country {
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue {
                field: "appstore.country".to_string(),
                message: "must be a two-letter country code".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_project_path() {
        let mut config = Config::default();
        config.project.path = Some(PathBuf::from("App/Info.plist"));
        assert!(validate_config(&config).is_err());

        config.project.path = Some(PathBuf::from("App.xcodeproj/project.pbxproj"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_bad_country_and_platform() {
        let mut config = Config::default();
        config.appstore.country = Some("usa".to_string());
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.appstore.platform = "android".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_blank_target() {
        let mut config = Config::default();
        config.project.target = Some("  ".to_string());
        assert!(validate_config(&config).is_err());
    }
}
