//! Plugin metadata repository.

use chrono::Utc;
use sqlx::SqlitePool;

use kiln_core::error::{AppError, ErrorKind};
use kiln_core::result::AppResult;
use kiln_entity::plugin::{NewPlugin, PluginRecord};

const PLUGIN_COLUMNS: &str = "plugin_id, plugin_enabled, plugin_name, plugin_folder, \
     plugin_class, plugin_extends, plugin_type, plugin_desc, plugin_version, \
     plugin_order, plugin_author, plugin_authorurl";

/// Repository for the `plugins` table.
#[derive(Debug, Clone)]
pub struct PluginRepository {
    pool: SqlitePool,
}

impl PluginRepository {
    /// Create a new plugin repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every plugin row, in a single query.
    pub async fn find_all(&self) -> AppResult<Vec<PluginRecord>> {
        sqlx::query_as::<_, PluginRecord>(&format!(
            "SELECT {PLUGIN_COLUMNS} FROM plugins ORDER BY plugin_id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list plugins", e))
    }

    /// Find a plugin by folder.
    pub async fn find_by_folder(&self, folder: &str) -> AppResult<Option<PluginRecord>> {
        sqlx::query_as::<_, PluginRecord>(&format!(
            "SELECT {PLUGIN_COLUMNS} FROM plugins WHERE plugin_folder = ?"
        ))
        .bind(folder)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find plugin", e))
    }

    /// The stored enabled flag of a folder, `None` when not installed.
    pub async fn enabled_status(&self, folder: &str) -> AppResult<Option<bool>> {
        sqlx::query_scalar::<_, bool>("SELECT plugin_enabled FROM plugins WHERE plugin_folder = ?")
            .bind(folder)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read plugin status", e)
            })
    }

    /// Number of enabled plugins.
    pub async fn count_enabled(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM plugins WHERE plugin_enabled = ?")
            .bind(true)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count enabled plugins", e)
            })
    }

    /// Insert a plugin row.
    pub async fn create(&self, data: &NewPlugin, updated_by: i64) -> AppResult<PluginRecord> {
        sqlx::query_as::<_, PluginRecord>(&format!(
            "INSERT INTO plugins (plugin_enabled, plugin_name, plugin_folder, plugin_class, \
             plugin_extends, plugin_type, plugin_desc, plugin_version, plugin_order, \
             plugin_author, plugin_authorurl, plugin_updatedts, plugin_updateby) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {PLUGIN_COLUMNS}"
        ))
        .bind(data.enabled)
        .bind(&data.name)
        .bind(&data.folder)
        .bind(&data.class)
        .bind(&data.extends)
        .bind(&data.plugin_type)
        .bind(&data.description)
        .bind(&data.version)
        .bind(data.order)
        .bind(&data.author)
        .bind(&data.author_url)
        .bind(Utc::now())
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::with_source(
                ErrorKind::Conflict,
                format!("Plugin folder '{}' is already installed", data.folder),
                e,
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create plugin", e),
        })
    }

    /// Set the enabled flag. Returns whether a row changed.
    pub async fn set_enabled(&self, folder: &str, enabled: bool, updated_by: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE plugins SET plugin_enabled = ?, plugin_updatedts = ?, plugin_updateby = ? \
             WHERE plugin_folder = ?",
        )
        .bind(enabled)
        .bind(Utc::now())
        .bind(updated_by)
        .bind(folder)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update plugin", e))?;
        Ok(result.rows_affected() > 0)
    }
}
