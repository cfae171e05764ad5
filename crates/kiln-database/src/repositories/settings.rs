//! Namespaced settings repository.

use chrono::Utc;
use sqlx::SqlitePool;

use kiln_core::error::{AppError, ErrorKind};
use kiln_core::result::AppResult;
use kiln_entity::setting::SettingRow;

/// Repository for the `settings` table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch a full settings row.
    pub async fn get(&self, namespace: &str, name: &str) -> AppResult<Option<SettingRow>> {
        sqlx::query_as::<_, SettingRow>(
            "SELECT settings_id, settings_plugin, settings_name, settings_value, \
             settings_updatedts, settings_updateby FROM settings \
             WHERE settings_plugin = ? AND settings_name = ?",
        )
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read setting", e))
    }

    /// Fetch only the serialized value.
    pub async fn get_value(&self, namespace: &str, name: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT settings_value FROM settings WHERE settings_plugin = ? AND settings_name = ?",
        )
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read setting", e))
    }

    /// Insert or replace a value.
    pub async fn upsert(
        &self,
        namespace: &str,
        name: &str,
        value: &str,
        updated_by: i64,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO settings (settings_plugin, settings_name, settings_value, \
             settings_updatedts, settings_updateby) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (settings_plugin, settings_name) DO UPDATE SET \
             settings_value = excluded.settings_value, \
             settings_updatedts = excluded.settings_updatedts, \
             settings_updateby = excluded.settings_updateby",
        )
        .bind(namespace)
        .bind(name)
        .bind(value)
        .bind(Utc::now())
        .bind(updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write setting", e))?;
        Ok(())
    }
}
