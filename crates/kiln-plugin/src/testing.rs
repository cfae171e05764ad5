//! Shared fixtures for unit tests.

use std::path::Path;

use sqlx::SqlitePool;

use kiln_database::DatabasePool;
use kiln_database::migration::run_migrations;

use crate::api::context::HostServices;

/// A migrated private in-memory database.
pub(crate) async fn sqlite_pool() -> SqlitePool {
    let db = DatabasePool::in_memory().await.unwrap();
    run_migrations(db.pool()).await.unwrap();
    db.into_pool()
}

/// Host services over a fresh in-memory database.
pub(crate) async fn sqlite_services() -> HostServices {
    HostServices::sqlite(sqlite_pool().await)
}

/// Creates the code unit `{dir}/{folder}/{folder}.plugin`.
pub(crate) fn write_code(dir: &Path, folder: &str) {
    let folder_dir = dir.join(folder);
    std::fs::create_dir_all(&folder_dir).unwrap();
    std::fs::write(folder_dir.join(format!("{folder}.plugin")), "").unwrap();
}
