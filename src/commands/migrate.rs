//! Database migration command.

use kiln_core::config::AppConfig;
use kiln_core::error::AppError;
use kiln_database::migration::run_migrations;

use crate::output;

/// Run all pending migrations
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    println!("Running database migrations...");
    run_migrations(pool.pool()).await?;

    for table in ["plugins", "pluginhooks", "widgets", "settings"] {
        if !pool.relation_exists(table).await? {
            return Err(AppError::database(format!(
                "Table '{table}' is missing after migration"
            )));
        }
    }
    output::print_success("All migrations applied successfully.");
    Ok(())
}
