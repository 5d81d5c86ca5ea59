//! Get command

use clap::Args;
use console::style;
use tracing::info;

use xcversion_core::config::load_config_or_default;
use xcversion_core::VersionField;
use xcversion_xcode::workflow::{self, ValueLocation};

use super::{FieldArg, SelectionArgs};
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Print the current version or build number
#[derive(Debug, Args)]
pub struct GetCommand {
    /// Value to read
    #[arg(value_enum)]
    pub field: FieldArg,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

impl GetCommand {
    /// Execute the get command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let field = VersionField::from(self.field);
        info!(field = %field, "executing get command");
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;

        let selection = self.selection.resolve(&config, &cwd);
        let reading = workflow::get(&selection, field)?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&reading)?);
            }
            OutputFormat::Text => {
                println!("{}", reading.value);
                if cli.verbose && !cli.quiet {
                    for entry in &reading.entries {
                        let location = match &entry.location {
                            ValueLocation::BuildSetting => field.build_setting_key().to_string(),
                            ValueLocation::InfoPlist { path } => path.display().to_string(),
                            ValueLocation::Missing => "not set".to_string(),
                        };
                        println!(
                            "{}",
                            output::key_value(
                                &format!("{} ({})", entry.target, entry.configuration),
                                &format!(
                                    "{} {}",
                                    entry.value.as_deref().unwrap_or("-"),
                                    style(location).dim()
                                ),
                            )
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
