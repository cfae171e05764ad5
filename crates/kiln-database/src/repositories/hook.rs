//! Hook binding repository.

use chrono::Utc;
use sqlx::SqlitePool;

use kiln_core::error::{AppError, ErrorKind};
use kiln_core::result::AppResult;
use kiln_entity::plugin::{HookBinding, HookCandidate};

const CANDIDATE_SELECT: &str = "SELECT h.phook_id, p.plugin_enabled, p.plugin_folder, \
     p.plugin_class, p.plugin_extends, p.plugin_type, h.plugin_hook \
     FROM pluginhooks h JOIN plugins p ON p.plugin_folder = h.plugin_folder";

/// Repository for the `pluginhooks` table.
#[derive(Debug, Clone)]
pub struct HookRepository {
    pool: SqlitePool,
}

impl HookRepository {
    /// Create a new hook repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Candidate rows for a hook, optionally restricted to one folder,
    /// in binding insertion order. Disabled plugins are included; the
    /// resolver needs them to decide overrides.
    pub async fn candidates(
        &self,
        hook: &str,
        folder: Option<&str>,
    ) -> AppResult<Vec<HookCandidate>> {
        let result = match folder {
            Some(folder) => {
                sqlx::query_as::<_, HookCandidate>(&format!(
                    "{CANDIDATE_SELECT} WHERE h.plugin_hook = ? AND h.plugin_folder = ? \
                     ORDER BY h.phook_id ASC"
                ))
                .bind(hook)
                .bind(folder)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, HookCandidate>(&format!(
                    "{CANDIDATE_SELECT} WHERE h.plugin_hook = ? ORDER BY h.phook_id ASC"
                ))
                .bind(hook)
                .fetch_all(&self.pool)
                .await
            }
        };

        result.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to query candidates for hook '{hook}'"),
                e,
            )
        })
    }

    /// Bind a folder to a hook. Binding twice keeps the original row and
    /// therefore the original dispatch position.
    pub async fn bind(&self, folder: &str, hook: &str, updated_by: i64) -> AppResult<HookBinding> {
        if let Some(existing) = self.find(folder, hook).await? {
            return Ok(existing);
        }

        sqlx::query_as::<_, HookBinding>(
            "INSERT INTO pluginhooks (plugin_folder, plugin_hook, plugin_updatedts, plugin_updateby) \
             VALUES (?, ?, ?, ?) RETURNING phook_id, plugin_folder, plugin_hook",
        )
        .bind(folder)
        .bind(hook)
        .bind(Utc::now())
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to bind hook", e))
    }

    /// Find a single binding.
    pub async fn find(&self, folder: &str, hook: &str) -> AppResult<Option<HookBinding>> {
        sqlx::query_as::<_, HookBinding>(
            "SELECT phook_id, plugin_folder, plugin_hook FROM pluginhooks \
             WHERE plugin_folder = ? AND plugin_hook = ? ORDER BY phook_id ASC LIMIT 1",
        )
        .bind(folder)
        .bind(hook)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find hook binding", e))
    }

    /// All bindings of a folder in insertion order.
    pub async fn find_by_folder(&self, folder: &str) -> AppResult<Vec<HookBinding>> {
        sqlx::query_as::<_, HookBinding>(
            "SELECT phook_id, plugin_folder, plugin_hook FROM pluginhooks \
             WHERE plugin_folder = ? ORDER BY phook_id ASC",
        )
        .bind(folder)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list hook bindings", e))
    }

    /// Remove a binding. Returns whether a row was deleted.
    pub async fn unbind(&self, folder: &str, hook: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM pluginhooks WHERE plugin_folder = ? AND plugin_hook = ?")
                .bind(folder)
                .bind(hook)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to unbind hook", e)
                })?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::plugin::PluginRepository;
    use crate::repositories::test_support::migrated_pool;
    use kiln_entity::plugin::NewPlugin;

    #[tokio::test]
    async fn test_candidates_follow_binding_order() {
        let pool = migrated_pool().await;
        let plugins = PluginRepository::new(pool.clone());
        let hooks = HookRepository::new(pool);

        plugins
            .create(&NewPlugin::new("core", "CoreHandler"), 0)
            .await
            .unwrap();
        plugins
            .create(
                &NewPlugin::new("ext", "ExtHandler")
                    .extends("CoreHandler")
                    .enabled(false),
                0,
            )
            .await
            .unwrap();

        hooks.bind("ext", "header", 0).await.unwrap();
        hooks.bind("core", "header", 0).await.unwrap();
        hooks.bind("core", "footer", 0).await.unwrap();

        let rows = hooks.candidates("header", None).await.unwrap();
        let folders: Vec<_> = rows.iter().map(|r| r.folder.as_str()).collect();
        assert_eq!(folders, vec!["ext", "core"]);
        assert!(!rows[0].enabled);
        assert_eq!(rows[0].parent_class(), Some("CoreHandler"));

        let only_core = hooks.candidates("header", Some("core")).await.unwrap();
        assert_eq!(only_core.len(), 1);
        assert!(hooks.candidates("missing", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bind_is_idempotent_and_unbind() {
        let hooks = HookRepository::new(migrated_pool().await);
        let first = hooks.bind("core", "header", 0).await.unwrap();
        let again = hooks.bind("core", "header", 0).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(hooks.find_by_folder("core").await.unwrap().len(), 1);

        assert!(hooks.unbind("core", "header").await.unwrap());
        assert!(!hooks.unbind("core", "header").await.unwrap());
    }
}
