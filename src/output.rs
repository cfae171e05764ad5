//! Table and JSON rendering for CLI commands.

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

use kiln_plugin::HookResults;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

/// Print rows as a table with a row count, or as a JSON array
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match (format, rows.len()) {
        (OutputFormat::Json, _) => println!("{}", to_json(rows, "[]")),
        (OutputFormat::Table, 0) => println!("No results found."),
        (OutputFormat::Table, 1) => println!("{}\n(1 row)", Table::new(rows)),
        (OutputFormat::Table, n) => println!("{}\n({n} rows)", Table::new(rows)),
    }
}

/// Print one value: debug layout for tables, JSON otherwise
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => println!("{}", to_json(item, "{}")),
    }
}

/// Print aggregated hook results in dispatch order
pub fn print_results(results: &HookResults, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", to_json(results, "{}"));
        }
        OutputFormat::Table => {
            for (key, value) in results.iter() {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                print_kv(key, &rendered);
            }
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message to stderr
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print an aligned key/value line
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {value}", format!("{key}:"));
}
