//! Plugin management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use kiln_core::error::AppError;
use kiln_entity::plugin::NewPlugin;

use super::CommandContext;
use crate::output;

/// Arguments for plugin commands
#[derive(Debug, Args)]
pub struct PluginArgs {
    /// Plugin subcommand
    #[command(subcommand)]
    pub command: PluginCommand,
}

/// Plugin subcommands
#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// List installed plugins
    List,
    /// Show one plugin's profile
    Show {
        /// Plugin folder
        folder: String,
    },
    /// Enable a plugin
    Enable {
        /// Plugin folder
        folder: String,
    },
    /// Disable a plugin
    Disable {
        /// Plugin folder
        folder: String,
    },
    /// Count enabled plugins
    Count,
    /// Install a plugin row
    Install(InstallArgs),
    /// Bind a plugin to a hook
    Bind {
        /// Plugin folder
        folder: String,
        /// Hook name
        hook: String,
    },
    /// Remove a plugin from a hook
    Unbind {
        /// Plugin folder
        folder: String,
        /// Hook name
        hook: String,
    },
    /// List the hooks a plugin is bound to
    Hooks {
        /// Plugin folder
        folder: String,
    },
    /// Reload cached plugin metadata
    Refresh,
}

/// Arguments for `plugin install`
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Plugin folder
    pub folder: String,
    /// Handler class name
    #[arg(long)]
    pub class: String,
    /// Parent class this plugin overrides
    #[arg(long, default_value = "")]
    pub extends: String,
    /// Display name (defaults to the folder)
    #[arg(long)]
    pub name: Option<String>,
    /// Type tag
    #[arg(long = "type", default_value = "")]
    pub plugin_type: String,
    /// Version string
    #[arg(long, default_value = "0.1")]
    pub version: String,
    /// Author
    #[arg(long, default_value = "")]
    pub author: String,
    /// Author website
    #[arg(long, default_value = "")]
    pub author_url: String,
    /// Install disabled
    #[arg(long)]
    pub disabled: bool,
}

/// Plugin display row for table output
#[derive(Debug, Serialize, Tabled)]
struct PluginRow {
    /// Folder
    folder: String,
    /// Class
    class: String,
    /// Parent class
    extends: String,
    /// Enabled
    enabled: bool,
    /// Type
    #[tabled(rename = "type")]
    plugin_type: String,
    /// Version
    version: String,
}

/// Hook binding display row
#[derive(Debug, Serialize, Tabled)]
struct BindingRow {
    /// Dispatch position
    position: i64,
    /// Hook
    hook: String,
}

/// Execute plugin commands
pub async fn execute(args: &PluginArgs, ctx: &CommandContext) -> Result<(), AppError> {
    let manager = &ctx.manager;

    match &args.command {
        PluginCommand::List => {
            let plugins = manager.registry().all().await?;
            let rows: Vec<PluginRow> = plugins
                .iter()
                .map(|p| PluginRow {
                    folder: p.folder.clone(),
                    class: p.class.clone(),
                    extends: p.extends.clone(),
                    enabled: p.enabled,
                    plugin_type: p.plugin_type.clone(),
                    version: p.version.clone(),
                })
                .collect();
            output::print_list(&rows, ctx.format);

            if let Err(e) = manager.registry().check_integrity().await {
                output::print_warning(&e.message);
            }
        }
        PluginCommand::Show { folder } => {
            let profile = manager
                .read_plugin(folder)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Plugin '{folder}' not found")))?;
            output::print_item(&profile, ctx.format);
        }
        PluginCommand::Enable { folder } => set_enabled(ctx, folder, true).await?,
        PluginCommand::Disable { folder } => set_enabled(ctx, folder, false).await?,
        PluginCommand::Count => match manager.count_active().await? {
            Some(count) => output::print_kv("Active plugins", &count.to_string()),
            None => println!("No active plugins."),
        },
        PluginCommand::Install(install) => {
            let mut plugin = NewPlugin::new(&install.folder, &install.class)
                .extends(&install.extends)
                .enabled(!install.disabled)
                .plugin_type(&install.plugin_type)
                .version(&install.version)
                .author(&install.author, &install.author_url);
            if let Some(name) = &install.name {
                plugin = plugin.name(name);
            }
            let record = manager.install(&plugin).await?;
            output::print_success(&format!(
                "Plugin '{}' installed (class {})",
                record.folder, record.class
            ));
        }
        PluginCommand::Bind { folder, hook } => {
            if manager.read_plugin(folder).await?.is_none() {
                return Err(AppError::not_found(format!("Plugin '{folder}' not found")));
            }
            let binding = manager.bind_hook(folder, hook).await?;
            output::print_success(&format!(
                "Plugin '{folder}' bound to hook '{hook}' (position {})",
                binding.id
            ));
        }
        PluginCommand::Unbind { folder, hook } => {
            if !manager.unbind_hook(folder, hook).await? {
                return Err(AppError::not_found(format!(
                    "Plugin '{folder}' is not bound to hook '{hook}'"
                )));
            }
            output::print_success(&format!("Plugin '{folder}' removed from hook '{hook}'"));
        }
        PluginCommand::Hooks { folder } => {
            let rows: Vec<BindingRow> = manager
                .hook_bindings(folder)
                .await?
                .into_iter()
                .map(|b| BindingRow {
                    position: b.id,
                    hook: b.hook,
                })
                .collect();
            output::print_list(&rows, ctx.format);
        }
        PluginCommand::Refresh => {
            manager.refresh();
            let plugins = manager.registry().load_all().await?;
            output::print_success(&format!("Plugin metadata reloaded ({} plugins)", plugins.len()));
        }
    }

    Ok(())
}

async fn set_enabled(ctx: &CommandContext, folder: &str, enabled: bool) -> Result<(), AppError> {
    if !ctx.manager.set_enabled(folder, enabled).await? {
        return Err(AppError::not_found(format!("Plugin '{folder}' not found")));
    }
    let state = if enabled { "enabled" } else { "disabled" };
    output::print_success(&format!("Plugin '{folder}' {state}"));
    Ok(())
}
