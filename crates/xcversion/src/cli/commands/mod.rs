//! CLI commands

mod bump;
mod get;

pub use bump::BumpCommand;
pub use get::GetCommand;

use std::path::{Path, PathBuf};

use clap::Args;
use xcversion_core::config::Config;
use xcversion_core::VersionField;
use xcversion_xcode::ProjectSelection;

/// Which value a command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FieldArg {
    /// Marketing version (MARKETING_VERSION)
    Version,
    /// Build number (CURRENT_PROJECT_VERSION)
    Build,
}

impl From<FieldArg> for VersionField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Version => VersionField::MarketingVersion,
            FieldArg::Build => VersionField::BuildNumber,
        }
    }
}

/// Project selection flags shared by all commands
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Path to the .xcodeproj or its project.pbxproj
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Only this target
    #[arg(short, long)]
    pub target: Option<String>,

    /// Only this build configuration (e.g. Release)
    #[arg(short = 'c', long)]
    pub configuration: Option<String>,

    /// Only the targets built by this scheme
    #[arg(short, long)]
    pub scheme: Option<String>,
}

impl SelectionArgs {
    /// Flags over config values
    pub fn resolve(&self, config: &Config, cwd: &Path) -> ProjectSelection {
        ProjectSelection {
            project: self.project.clone().or_else(|| config.project.path.clone()),
            cwd: cwd.to_path_buf(),
            target: self.target.clone().or_else(|| config.project.target.clone()),
            configuration: self
                .configuration
                .clone()
                .or_else(|| config.project.configuration.clone()),
            scheme: self.scheme.clone().or_else(|| config.project.scheme.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.project.target = Some("App".to_string());
        config.project.scheme = Some("App".to_string());

        let args = SelectionArgs {
            project: None,
            target: Some("Widget".to_string()),
            configuration: None,
            scheme: None,
        };
        let selection = args.resolve(&config, Path::new("/tmp"));
        assert_eq!(selection.target.as_deref(), Some("Widget"));
        assert_eq!(selection.scheme.as_deref(), Some("App"));
        assert_eq!(selection.configuration, None);
    }
}
