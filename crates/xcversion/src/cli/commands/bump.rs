//! Bump command

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::info;

use xcversion_core::config::{load_config_or_default, Config, EXPORT_FILE_ENV};
use xcversion_core::{BaselinePolicy, VersionField, VersionSourceKind};
use xcversion_strategies::BumpType;
use xcversion_stores::apple::{AppStoreLookup, LookupConfig};
use xcversion_stores::{Platform, VersionSource};
use xcversion_xcode::workflow::{self, BumpOptions, BumpOutcome};
use xcversion_xcode::BumpRequest;

use super::{FieldArg, SelectionArgs};
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Bump the version or build number
#[derive(Debug, Args)]
pub struct BumpCommand {
    /// Value to bump
    #[arg(value_enum)]
    pub field: FieldArg,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Write this value verbatim instead of bumping
    #[arg(long = "version", visible_alias = "build-number", value_name = "VALUE")]
    pub explicit: Option<String>,

    /// Component to bump (major, minor, patch)
    #[arg(short, long)]
    pub bump_type: Option<BumpType>,

    /// Where the current version comes from (local, appstore)
    #[arg(long)]
    pub version_source: Option<VersionSourceKind>,

    /// Bundle identifier to look up on the App Store
    #[arg(long)]
    pub app_identifier: Option<String>,

    /// Two-letter App Store storefront country
    #[arg(long)]
    pub country: Option<String>,

    /// Platform to look up on the App Store (ios, macos)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Write 1.2.0 as 1.2
    #[arg(long)]
    pub omit_zero_patch: bool,

    /// How to handle configurations that disagree (strict, first, highest)
    #[arg(long)]
    pub baseline: Option<BaselinePolicy>,

    /// Resolve and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Append KEY=value lines for later pipeline steps to this file
    #[arg(long, env = EXPORT_FILE_ENV)]
    pub export: Option<PathBuf>,
}

impl BumpCommand {
    /// Execute the bump command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let field = VersionField::from(self.field);
        info!(
            field = %field,
            bump_type = ?self.bump_type,
            dry_run = self.dry_run,
            "executing bump command"
        );
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;

        let request = self.request(field, &config)?;
        let lookup = match request.source {
            VersionSourceKind::AppStore => {
                let mut lookup_config = LookupConfig::default();
                if let Some(country) = self.country.as_ref().or(config.appstore.country.as_ref()) {
                    lookup_config = lookup_config.with_country(country);
                }
                Some(AppStoreLookup::new(lookup_config))
            }
            VersionSourceKind::Local => None,
        };

        let options = BumpOptions {
            selection: self.selection.resolve(&config, &cwd),
            request,
            dry_run: self.dry_run,
        };
        let source = lookup.as_ref().map(|l| l as &dyn VersionSource);
        let outcome = workflow::bump(options, source).await?;

        if let Some(path) = &self.export {
            if !outcome.dry_run {
                outcome
                    .shared_values()
                    .append_to(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        }

        self.output_result(&outcome, cli)
    }

    /// Flags over config values
    fn request(&self, field: VersionField, config: &Config) -> anyhow::Result<BumpRequest> {
        let platform = match self.platform {
            Some(platform) => platform,
            None => config
                .appstore
                .platform
                .parse::<Platform>()
                .map_err(|e| anyhow::anyhow!(e))?,
        };
        let source = self.version_source.unwrap_or(config.versioning.source);

        let mut bump_type = self.bump_type;
        if field == VersionField::MarketingVersion
            && self.explicit.is_none()
            && bump_type.is_none()
            && source == VersionSourceKind::Local
        {
            bump_type = Some(BumpType::Patch);
        }

        Ok(BumpRequest {
            field,
            explicit: self.explicit.clone(),
            bump_type,
            source,
            app_identifier: self
                .app_identifier
                .clone()
                .or_else(|| config.appstore.app_identifier.clone()),
            platform,
            omit_zero_patch: self.omit_zero_patch || config.versioning.omit_zero_patch,
            baseline: self.baseline.unwrap_or(config.versioning.baseline),
        })
    }

    fn output_result(&self, outcome: &BumpOutcome, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "field": outcome.field,
                    "previous": outcome.previous,
                    "value": outcome.value,
                    "project": outcome.project,
                    "files": outcome.files,
                    "entries": outcome.entries,
                    "dry_run": outcome.dry_run,
                    "shared": outcome.shared_values(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    println!("{}", outcome.value);
                    return Ok(());
                }

                let previous = outcome.previous.as_deref().unwrap_or("-");
                let message = format!(
                    "{} {} -> {}",
                    outcome.field,
                    style(previous).cyan(),
                    output::version_style().apply_to(&outcome.value)
                );
                if outcome.dry_run {
                    output::warning(&format!("{} (dry run)", message));
                } else {
                    output::success(&message);
                }

                if cli.verbose {
                    for entry in &outcome.entries {
                        println!("{}", output::key_value(&entry.target, &entry.configuration));
                    }
                }
                for file in &outcome.files {
                    println!("  {}", output::path_style().apply_to(file.display()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> BumpCommand {
        let mut argv = vec!["xcversion", "bump"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            crate::cli::Commands::Bump(cmd) => cmd,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_version_defaults_to_patch() {
        let cmd = parse(&["version"]);
        let request = cmd.request(VersionField::MarketingVersion, &Config::default()).unwrap();
        assert_eq!(request.bump_type, Some(BumpType::Patch));

        let cmd = parse(&["version", "--version", "2.0"]);
        let request = cmd.request(VersionField::MarketingVersion, &Config::default()).unwrap();
        assert_eq!(request.bump_type, None);
        assert_eq!(request.explicit.as_deref(), Some("2.0"));

        let cmd = parse(&["build"]);
        let request = cmd.request(VersionField::BuildNumber, &Config::default()).unwrap();
        assert_eq!(request.bump_type, None);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.versioning.omit_zero_patch = true;
        config.versioning.baseline = BaselinePolicy::First;
        config.appstore.app_identifier = Some("com.example.config".to_string());
        config.appstore.platform = "macos".to_string();

        let cmd = parse(&[
            "version",
            "--bump-type",
            "major",
            "--version-source",
            "appstore",
            "--baseline",
            "highest",
        ]);
        let request = cmd.request(VersionField::MarketingVersion, &config).unwrap();
        assert_eq!(request.bump_type, Some(BumpType::Major));
        assert_eq!(request.source, VersionSourceKind::AppStore);
        assert_eq!(request.baseline, BaselinePolicy::Highest);
        assert!(request.omit_zero_patch);
        assert_eq!(request.platform, Platform::Macos);
        assert_eq!(request.app_identifier.as_deref(), Some("com.example.config"));
    }
}
