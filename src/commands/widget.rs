//! Widget management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use kiln_core::error::AppError;
use kiln_entity::widget::WidgetEntry;
use kiln_plugin::WidgetRegistry;

use super::CommandContext;
use crate::output::{self, OutputFormat};

/// Arguments for widget commands
#[derive(Debug, Args)]
pub struct WidgetArgs {
    /// Widget subcommand
    #[command(subcommand)]
    pub command: WidgetCommand,
}

/// Widget subcommands
#[derive(Debug, Subcommand)]
pub enum WidgetCommand {
    /// Register a widget function for a plugin
    Add {
        /// Owning plugin folder
        plugin: String,
        /// Widget function name
        function: String,
        /// Opaque widget arguments
        #[arg(long, default_value = "")]
        args: String,
    },
    /// Remove every row of a widget function
    Delete {
        /// Widget function name
        function: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List stored widget rows
    List,
    /// Rebuild the widget settings document from stored rows
    Init,
    /// Show persisted widgets in display order
    Ordered,
    /// Show the plugin owning a widget function
    Owner {
        /// Widget function name
        function: String,
    },
}

/// Stored widget display row
#[derive(Debug, Serialize, Tabled)]
struct WidgetRow {
    /// ID
    id: i64,
    /// Plugin folder
    plugin: String,
    /// Function
    function: String,
    /// Arguments
    args: String,
    /// Updated at
    updated_at: String,
}

/// Widget settings display row
#[derive(Debug, Serialize, Tabled)]
struct PlacementRow {
    /// Function
    function: String,
    /// Order
    order: i64,
    /// Block
    block: String,
    /// Enabled
    enabled: bool,
    /// Plugin folder
    plugin: String,
    /// Class
    class: String,
}

impl PlacementRow {
    fn new(function: &str, entry: &WidgetEntry) -> Self {
        Self {
            function: function.to_string(),
            order: entry.sort_order(),
            block: entry.block.map(|b| b.to_string()).unwrap_or_default(),
            enabled: entry.is_enabled(),
            plugin: entry.plugin.clone().unwrap_or_default(),
            class: entry.class.clone().unwrap_or_default(),
        }
    }
}

/// Execute widget commands
pub async fn execute(args: &WidgetArgs, ctx: &CommandContext) -> Result<(), AppError> {
    let widgets = ctx.manager.widgets();

    match &args.command {
        WidgetCommand::Add {
            plugin,
            function,
            args,
        } => {
            if widgets.add(plugin, function, args).await? {
                output::print_success(&format!("Widget '{function}' added for plugin '{plugin}'"));
            } else {
                output::print_warning(&format!("Widget '{function}' is already registered"));
            }
        }
        WidgetCommand::Delete { function, yes } => {
            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete every row of widget '{function}'?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let removed = widgets.delete(function).await?;
            output::print_success(&format!("Widget '{function}' deleted ({removed} rows)"));
        }
        WidgetCommand::List => match widgets.list_raw().await? {
            Some(records) => {
                let rows: Vec<WidgetRow> = records
                    .into_iter()
                    .map(|w| WidgetRow {
                        id: w.id,
                        plugin: w.plugin,
                        function: w.function,
                        args: w.args,
                        updated_at: w.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    })
                    .collect();
                output::print_list(&rows, ctx.format);
            }
            None => output::print_warning("Widgets table does not exist; run `kiln migrate`"),
        },
        WidgetCommand::Init => match widgets.initialize().await? {
            Some(document) => {
                output::print_success(&format!(
                    "Widget settings initialized ({} widgets)",
                    document.widgets.len()
                ));
                print_placements(&document.widgets, ctx.format);
            }
            None => println!("No widgets registered; settings left untouched."),
        },
        WidgetCommand::Ordered => match widgets.ordered_widgets().await? {
            Some(ordered) => {
                print_placements(&ordered, ctx.format);
                if ctx.format == OutputFormat::Table {
                    output::print_kv(
                        "Highest block",
                        &WidgetRegistry::highest_block(&ordered).to_string(),
                    );
                }
            }
            None => println!("No widget settings stored."),
        },
        WidgetCommand::Owner { function } => match widgets.owner_of(function).await? {
            Some(folder) => output::print_kv(function, &folder),
            None => {
                return Err(AppError::not_found(format!("Widget '{function}' not found")));
            }
        },
    }

    Ok(())
}

fn print_placements(widgets: &kiln_entity::widget::WidgetMap, format: OutputFormat) {
    let rows: Vec<PlacementRow> = widgets
        .iter()
        .map(|(function, entry)| PlacementRow::new(function, entry))
        .collect();
    output::print_list(&rows, format);
}
