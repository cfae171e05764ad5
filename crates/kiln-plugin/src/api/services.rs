//! SQLite-backed implementations of the host service traits.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use kiln_core::result::AppResult;
use kiln_database::repositories::{
    HookRepository, PluginRepository, SettingsRepository, WidgetRepository,
};
use kiln_entity::plugin::{HookBinding, HookCandidate, NewPlugin, PluginRecord};
use kiln_entity::widget::WidgetRecord;

use super::context::{HostServices, PluginStore, SettingsStore, WidgetStore};

impl HostServices {
    /// Services backed by one SQLite pool.
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            plugins: Arc::new(SqlPluginStore::new(pool.clone())),
            widgets: Arc::new(SqlWidgetStore::new(pool.clone())),
            settings: Arc::new(SqlSettingsStore::new(pool)),
        }
    }
}

/// Plugin store over the `plugins` and `pluginhooks` tables.
#[derive(Debug, Clone)]
pub struct SqlPluginStore {
    plugins: PluginRepository,
    hooks: HookRepository,
}

impl SqlPluginStore {
    /// Creates a plugin store.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            plugins: PluginRepository::new(pool.clone()),
            hooks: HookRepository::new(pool),
        }
    }
}

#[async_trait]
impl PluginStore for SqlPluginStore {
    async fn all_plugins(&self) -> AppResult<Vec<PluginRecord>> {
        self.plugins.find_all().await
    }

    async fn enabled_status(&self, folder: &str) -> AppResult<Option<bool>> {
        self.plugins.enabled_status(folder).await
    }

    async fn count_enabled(&self) -> AppResult<u64> {
        let count = self.plugins.count_enabled().await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn hook_candidates(
        &self,
        hook: &str,
        folder: Option<&str>,
    ) -> AppResult<Vec<HookCandidate>> {
        self.hooks.candidates(hook, folder).await
    }

    async fn install(&self, plugin: &NewPlugin, updated_by: i64) -> AppResult<PluginRecord> {
        self.plugins.create(plugin, updated_by).await
    }

    async fn set_enabled(&self, folder: &str, enabled: bool, updated_by: i64) -> AppResult<bool> {
        self.plugins.set_enabled(folder, enabled, updated_by).await
    }

    async fn bind_hook(
        &self,
        folder: &str,
        hook: &str,
        updated_by: i64,
    ) -> AppResult<HookBinding> {
        self.hooks.bind(folder, hook, updated_by).await
    }

    async fn hook_bindings(&self, folder: &str) -> AppResult<Vec<HookBinding>> {
        self.hooks.find_by_folder(folder).await
    }

    async fn unbind_hook(&self, folder: &str, hook: &str) -> AppResult<bool> {
        self.hooks.unbind(folder, hook).await
    }
}

/// Widget store over the `widgets` table.
#[derive(Debug, Clone)]
pub struct SqlWidgetStore {
    repo: WidgetRepository,
}

impl SqlWidgetStore {
    /// Creates a widget store.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: WidgetRepository::new(pool),
        }
    }
}

#[async_trait]
impl WidgetStore for SqlWidgetStore {
    async fn relation_exists(&self) -> AppResult<bool> {
        self.repo.table_exists().await
    }

    async fn list(&self) -> AppResult<Vec<WidgetRecord>> {
        self.repo.find_all().await
    }

    async fn exists(&self, plugin: &str, function: &str, args: &str) -> AppResult<bool> {
        self.repo.exists(plugin, function, args).await
    }

    async fn insert(
        &self,
        plugin: &str,
        function: &str,
        args: &str,
        updated_by: i64,
    ) -> AppResult<bool> {
        self.repo.insert(plugin, function, args, updated_by).await
    }

    async fn delete_by_function(&self, function: &str) -> AppResult<u64> {
        self.repo.delete_by_function(function).await
    }

    async fn owner_of(&self, function: &str) -> AppResult<Option<String>> {
        self.repo.plugin_for_function(function).await
    }

    async fn optimize(&self) -> AppResult<()> {
        self.repo.optimize().await
    }
}

/// Settings store over the `settings` table.
#[derive(Debug, Clone)]
pub struct SqlSettingsStore {
    repo: SettingsRepository,
}

impl SqlSettingsStore {
    /// Creates a settings store.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: SettingsRepository::new(pool),
        }
    }
}

#[async_trait]
impl SettingsStore for SqlSettingsStore {
    async fn get(&self, namespace: &str, name: &str) -> AppResult<Option<String>> {
        self.repo.get_value(namespace, name).await
    }

    async fn set(
        &self,
        namespace: &str,
        name: &str,
        value: &str,
        updated_by: i64,
    ) -> AppResult<()> {
        self.repo.upsert(namespace, name, value, updated_by).await
    }
}
