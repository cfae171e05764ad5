//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use kiln_core::config::AppConfig;
use kiln_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => output::print_item(config, format),
        ConfigCommand::Validate => {
            let source = config_path.unwrap_or("config/");
            if let Err(e) = validate(config) {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
            output::print_success(&format!("Configuration '{source}' is valid"));
            output::print_kv("Database", &config.database.url);
            output::print_kv("Plugin directory", &config.plugins.directory);
            output::print_kv("Plugin code extension", &config.plugins.code_extension);
            output::print_kv(
                "Widget settings",
                &format!(
                    "{}.{}",
                    config.widgets.settings_namespace, config.widgets.settings_key
                ),
            );
            output::print_kv("Log level", &config.logging.level);
            output::print_kv("Log format", &format!("{:?}", config.logging.format));
        }
    }

    Ok(())
}

fn validate(config: &AppConfig) -> Result<(), AppError> {
    if config.database.max_connections == 0 {
        return Err(AppError::configuration("database.max_connections must be at least 1"));
    }
    if config.plugins.directory.is_empty() {
        return Err(AppError::configuration("plugins.directory must not be empty"));
    }
    if config.plugins.code_extension.is_empty() {
        return Err(AppError::configuration("plugins.code_extension must not be empty"));
    }
    if config.widgets.settings_namespace.is_empty() || config.widgets.settings_key.is_empty() {
        return Err(AppError::configuration(
            "widgets.settings_namespace and widgets.settings_key must not be empty",
        ));
    }
    Ok(())
}
