//! CLI command definitions and dispatch.

pub mod config;
pub mod hook;
pub mod migrate;
pub mod plugin;
pub mod widget;

use clap::{Parser, Subcommand};

use kiln_core::config::AppConfig;
use kiln_core::error::AppError;
use kiln_database::DatabasePool;
use kiln_entity::user::CurrentUser;
use kiln_plugin::{DefaultHooks, PluginManager};
#[cfg(not(feature = "dynamic"))]
use kiln_plugin::PluginClass;
use kiln_plugin::api::HostServices;

use crate::output::OutputFormat;

/// Kiln: plugin hooks and widgets administration
#[derive(Debug, Parser)]
#[command(name = "kiln", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (default: config/default.toml + KILN_ENV overlay)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// User id recorded on writes
    #[arg(long, default_value_t = 0)]
    pub user_id: i64,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run database migrations
    Migrate,
    /// Plugin management
    Plugin(plugin::PluginArgs),
    /// Fire or inspect hooks
    Hook(hook::HookArgs),
    /// Widget management
    Widget(widget::WidgetArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Plugin(args) => plugin::execute(args, &self.context(config).await?).await,
            Commands::Hook(args) => hook::execute(args, &self.context(config).await?).await,
            Commands::Widget(args) => widget::execute(args, &self.context(config).await?).await,
            Commands::Config(args) => {
                config::execute(args, &config, self.config.as_deref(), self.format)
            }
        }
    }

    async fn context(&self, config: AppConfig) -> Result<CommandContext, AppError> {
        let pool = create_db_pool(&config).await?;
        let user = CurrentUser::new(self.user_id, "cli");
        Ok(CommandContext {
            manager: build_manager(&config, pool, user).await?,
            format: self.format,
        })
    }
}

/// What storage-backed commands run against.
#[derive(Debug)]
pub struct CommandContext {
    /// The plugin host.
    pub manager: PluginManager,
    /// Output format.
    pub format: OutputFormat,
}

/// Helper: load configuration from an explicit file, or from the
/// `config/` directory for `KILN_ENV` (default `development`).
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, AppError> {
    match config_path {
        Some(path) => AppConfig::load_from(path),
        None => {
            let env = std::env::var("KILN_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire a plugin manager over the database.
///
/// Hooks without a plugin implementation run the host defaults. Without the
/// `dynamic` feature no plugin code is compiled into the CLI, so every
/// installed plugin is declared by its stored class and parent and its hooks
/// resolve to those defaults.
pub async fn build_manager(
    config: &AppConfig,
    pool: DatabasePool,
    user: CurrentUser,
) -> Result<PluginManager, AppError> {
    let services = HostServices::sqlite(pool.into_pool());
    #[cfg(not(feature = "dynamic"))]
    let installed = services.plugins.all_plugins().await?;

    let builder = PluginManager::builder(services)
        .plugin_config(config.plugins.clone())
        .widget_config(config.widgets.clone())
        .defaults(DefaultHooks::host())
        .user(user);

    #[cfg(feature = "dynamic")]
    let builder = builder.loader(|plugin_config, classes| {
        std::sync::Arc::new(kiln_plugin::loader::DynamicLoader::new(
            plugin_config.clone(),
            classes,
        ))
    });

    #[cfg(not(feature = "dynamic"))]
    let builder = installed
        .into_iter()
        .filter(|record| !record.class.is_empty())
        .fold(builder, |builder, record| {
            let class = PluginClass::new(&record.class).extends(&record.extends);
            builder.with_class(record.folder, class)
        });

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_plugins(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.plugins.directory = dir.to_string_lossy().into_owned();
        config
    }

    #[cfg(not(feature = "dynamic"))]
    #[tokio::test]
    async fn test_build_manager_fires_host_defaults() {
        use kiln_entity::plugin::NewPlugin;
        use serde_json::json;

        let dir = tempfile::tempdir().unwrap();
        let config = config_with_plugins(dir.path());
        let pool = DatabasePool::in_memory().await.unwrap();
        kiln_database::migration::run_migrations(pool.pool()).await.unwrap();

        let setup = build_manager(&config, pool.clone(), CurrentUser::new(1, "cli"))
            .await
            .unwrap();
        setup
            .install(&NewPlugin::new("gallery", "Gallery").name("Photo Gallery"))
            .await
            .unwrap();
        setup
            .bind_hook("gallery", "admin_sidebar_plugin_settings")
            .await
            .unwrap();
        std::fs::create_dir_all(dir.path().join("gallery")).unwrap();
        std::fs::write(config.plugins.code_path("gallery"), "").unwrap();

        let manager = build_manager(&config, pool, CurrentUser::new(1, "cli"))
            .await
            .unwrap();
        let results = manager
            .plugin_hook("admin_sidebar_plugin_settings", None, &json!({}), &[])
            .await
            .expect("default contributes");

        assert_eq!(
            results.get("Gallery_admin_sidebar_plugin_settings"),
            Some(&json!({ "folder": "gallery", "label": "Photo Gallery" }))
        );
    }
}
