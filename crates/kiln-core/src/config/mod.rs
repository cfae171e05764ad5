//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a default so partial files are valid.

pub mod database;
pub mod logging;
pub mod plugin;
pub mod widget;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::plugin::PluginConfig;
pub use self::widget::WidgetConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides (`KILN__PLUGINS__DIRECTORY`).
const ENV_PREFIX: &str = "KILN";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Plugin discovery and dispatch settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Widget settings storage.
    #[serde(default)]
    pub widgets: WidgetConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for an environment.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` and environment
    /// variables prefixed with `KILN__`. Missing files are not an error.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(Self::environment())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration from an explicit file path plus environment overrides.
    ///
    /// Unlike [`AppConfig::load`], the file is required.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(Self::environment())
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to build config from '{}': {e}",
                    path.display()
                ))
            })?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }
}
