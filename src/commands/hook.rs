//! Hook CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use kiln_core::error::AppError;

use super::CommandContext;
use crate::output;

/// Arguments for hook commands
#[derive(Debug, Args)]
pub struct HookArgs {
    /// Hook subcommand
    #[command(subcommand)]
    pub command: HookCommand,
}

/// Options shared by hook subcommands
#[derive(Debug, Args)]
pub struct HookTarget {
    /// Hook name
    pub hook: String,
    /// Only consider this plugin folder
    #[arg(long)]
    pub folder: Option<String>,
    /// Never dispatch to these plugin folders
    #[arg(long)]
    pub exclude: Vec<String>,
}

/// Hook subcommands
#[derive(Debug, Subcommand)]
pub enum HookCommand {
    /// Fire a hook and print the aggregated results
    Fire {
        #[command(flatten)]
        target: HookTarget,
        /// Parameters passed to every handler, as JSON
        #[arg(long)]
        params: Option<String>,
    },
    /// Show the handlers a hook would dispatch to
    Resolve {
        #[command(flatten)]
        target: HookTarget,
    },
}

/// Dispatch target display row
#[derive(Debug, Serialize, Tabled)]
struct TargetRow {
    /// Position in dispatch order
    position: usize,
    /// Class
    class: String,
    /// Folder
    folder: String,
    /// Parent class
    extends: String,
    /// Parent folders loaded first
    parents: String,
}

/// Execute hook commands
pub async fn execute(args: &HookArgs, ctx: &CommandContext) -> Result<(), AppError> {
    match &args.command {
        HookCommand::Fire { target, params } => {
            let params: Value = match params {
                Some(raw) => serde_json::from_str(raw).map_err(|e| {
                    AppError::validation(format!("--params is not valid JSON: {e}"))
                })?,
                None => Value::Null,
            };

            let results = ctx
                .manager
                .plugin_hook(&target.hook, target.folder.as_deref(), &params, &target.exclude)
                .await;

            match results {
                Some(results) => output::print_results(&results, ctx.format),
                None => println!("No handlers contributed to '{}'.", target.hook),
            }
        }
        HookCommand::Resolve { target } => {
            let planned = ctx
                .manager
                .plan(&target.hook, target.folder.as_deref(), &target.exclude)
                .await?;
            let rows: Vec<TargetRow> = planned
                .into_iter()
                .enumerate()
                .map(|(i, p)| TargetRow {
                    position: i + 1,
                    class: p.target.class,
                    folder: p.target.folder,
                    extends: p.target.extends,
                    parents: p.parents.join(", "),
                })
                .collect();
            output::print_list(&rows, ctx.format);
        }
    }

    Ok(())
}
