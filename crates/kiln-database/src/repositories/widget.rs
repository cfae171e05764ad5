//! Widget row repository.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use kiln_core::error::{AppError, ErrorKind};
use kiln_core::result::AppResult;
use kiln_entity::widget::WidgetRecord;

use crate::connection::relation_exists;

const WIDGETS_TABLE: &str = "widgets";

/// Repository for the `widgets` table.
#[derive(Debug, Clone)]
pub struct WidgetRepository {
    pool: SqlitePool,
}

impl WidgetRepository {
    /// Create a new widget repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether the widgets table exists yet.
    pub async fn table_exists(&self) -> AppResult<bool> {
        relation_exists(&self.pool, WIDGETS_TABLE).await
    }

    /// Every widget row in insertion order.
    pub async fn find_all(&self) -> AppResult<Vec<WidgetRecord>> {
        sqlx::query_as::<_, WidgetRecord>(
            "SELECT widget_id, widget_plugin, widget_function, widget_args, \
             widget_updatedts, widget_updateby FROM widgets ORDER BY widget_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list widgets", e))
    }

    /// Whether a row with exactly this triple exists.
    pub async fn exists(&self, plugin: &str, function: &str, args: &str) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT widget_id FROM widgets \
             WHERE widget_plugin = ? AND widget_function = ? AND widget_args = ?",
        )
        .bind(plugin)
        .bind(function)
        .bind(args)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up widget", e))?;
        Ok(found.is_some())
    }

    /// Insert a widget row. Returns false when the triple already existed.
    pub async fn insert(
        &self,
        plugin: &str,
        function: &str,
        args: &str,
        updated_by: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO widgets (widget_plugin, widget_function, widget_args, \
             widget_updatedts, widget_updateby) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (widget_plugin, widget_function, widget_args) DO NOTHING",
        )
        .bind(plugin)
        .bind(function)
        .bind(args)
        .bind(Utc::now())
        .bind(updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert widget", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every row for a widget function. Returns the number removed.
    pub async fn delete_by_function(&self, function: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM widgets WHERE widget_function = ?")
            .bind(function)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete widget", e)
            })?;
        Ok(result.rows_affected())
    }

    /// The plugin owning the first row for a widget function.
    pub async fn plugin_for_function(&self, function: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT widget_plugin FROM widgets WHERE widget_function = ? \
             ORDER BY widget_id ASC LIMIT 1",
        )
        .bind(function)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to look up widget owner", e)
        })
    }

    /// Ask SQLite to refresh its query planner statistics.
    pub async fn optimize(&self) -> AppResult<()> {
        debug!("Optimizing widgets table");
        sqlx::query("PRAGMA optimize")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to optimize storage", e)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::migrated_pool;

    #[tokio::test]
    async fn test_insert_is_unique_per_triple() {
        let repo = WidgetRepository::new(migrated_pool().await);
        assert!(repo.table_exists().await.unwrap());
        assert!(repo.insert("blog", "recent_posts", "", 3).await.unwrap());
        assert!(!repo.insert("blog", "recent_posts", "", 3).await.unwrap());
        assert!(repo.insert("blog", "recent_posts", "limit=5", 3).await.unwrap());
        assert!(repo.exists("blog", "recent_posts", "").await.unwrap());

        let rows = repo.find_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].updated_by, 3);
    }

    #[tokio::test]
    async fn test_delete_and_owner() {
        let repo = WidgetRepository::new(migrated_pool().await);
        repo.insert("blog", "recent_posts", "", 0).await.unwrap();
        repo.insert("blog", "recent_posts", "x", 0).await.unwrap();
        assert_eq!(
            repo.plugin_for_function("recent_posts").await.unwrap(),
            Some("blog".to_string())
        );
        assert_eq!(repo.delete_by_function("recent_posts").await.unwrap(), 2);
        assert_eq!(repo.delete_by_function("recent_posts").await.unwrap(), 0);
        assert_eq!(repo.plugin_for_function("recent_posts").await.unwrap(), None);
        repo.optimize().await.unwrap();
    }
}
