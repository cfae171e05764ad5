//! Plugin registry: cached plugin metadata and folder/class lookups.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use kiln_cache::ScopedCache;
use kiln_core::config::PluginConfig;
use kiln_core::error::AppError;
use kiln_core::result::AppResult;
use kiln_entity::plugin::{HookBinding, HookCandidate, NewPlugin, PluginRecord};

use crate::api::context::PluginStore;

/// Metadata for every installed plugin, loaded once and kept until
/// [`PluginRegistry::refresh`].
pub struct PluginRegistry {
    /// Plugin storage.
    store: Arc<dyn PluginStore>,
    /// All plugin rows.
    metadata: ScopedCache<(), Arc<Vec<PluginRecord>>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry").finish()
    }
}

impl PluginRegistry {
    /// Creates a registry over a plugin store.
    pub fn new(store: Arc<dyn PluginStore>, config: &PluginConfig) -> Self {
        Self {
            store,
            metadata: ScopedCache::new(
                "plugin_metadata",
                1,
                Duration::from_secs(config.metadata_cache_ttl_seconds),
            ),
        }
    }

    /// Loads every plugin row into the cache. A no-op when already loaded.
    pub async fn load_all(&self) -> AppResult<Arc<Vec<PluginRecord>>> {
        let store = self.store.clone();
        self.metadata
            .get_or_try_load((), async move {
                let rows = store.all_plugins().await?;
                info!(count = rows.len(), "Plugin metadata loaded");
                Ok(Arc::new(rows))
            })
            .await
    }

    /// Drops cached metadata; the next lookup reloads.
    pub fn refresh(&self) {
        debug!("Refreshing plugin registry");
        self.metadata.invalidate_all();
    }

    /// All plugin rows.
    pub async fn all(&self) -> AppResult<Arc<Vec<PluginRecord>>> {
        self.load_all().await
    }

    /// Folder of the plugin declaring `class`.
    pub async fn find_folder_by_class(&self, class: &str) -> AppResult<Option<String>> {
        let plugins = self.load_all().await?;
        Ok(plugins
            .iter()
            .find(|p| p.class == class)
            .map(|p| p.folder.clone()))
    }

    /// Full metadata of a folder.
    pub async fn find_metadata_by_folder(&self, folder: &str) -> AppResult<Option<PluginRecord>> {
        let plugins = self.load_all().await?;
        Ok(plugins.iter().find(|p| p.folder == folder).cloned())
    }

    /// Handler class of a folder.
    pub async fn class_of(&self, folder: &str) -> AppResult<Option<String>> {
        let plugins = self.load_all().await?;
        Ok(plugins
            .iter()
            .find(|p| p.folder == folder)
            .map(|p| p.class.clone()))
    }

    /// Whether a folder is enabled, read straight from storage.
    pub async fn is_enabled(&self, folder: &str) -> AppResult<bool> {
        Ok(self.store.enabled_status(folder).await?.unwrap_or(false))
    }

    /// Number of enabled plugins, `None` when there are none.
    pub async fn count_enabled(&self) -> AppResult<Option<u64>> {
        let count = self.store.count_enabled().await?;
        Ok((count > 0).then_some(count))
    }

    /// Hook candidates for `hook` in binding order.
    ///
    /// Always read from storage: one resolve shares one result set, and a
    /// status change made outside this registry applies to the next call.
    pub async fn hook_candidates(
        &self,
        hook: &str,
        folder: Option<&str>,
    ) -> AppResult<Arc<Vec<HookCandidate>>> {
        let rows = self.store.hook_candidates(hook, folder).await?;
        debug!(hook = %hook, folder = ?folder, candidates = rows.len(), "Hook candidates fetched");
        Ok(Arc::new(rows))
    }

    /// Checks the metadata invariants dispatch relies on.
    ///
    /// Returns a `DataIntegrity` error listing every violation found.
    pub async fn check_integrity(&self) -> AppResult<()> {
        let plugins = self.load_all().await?;
        let problems = integrity_problems(&plugins);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::data_integrity(problems.join("; ")))
        }
    }

    // ── Administrative writes ──

    /// Installs a plugin row.
    pub async fn install(&self, plugin: &NewPlugin, updated_by: i64) -> AppResult<PluginRecord> {
        let record = self.store.install(plugin, updated_by).await?;
        info!(folder = %record.folder, class = %record.class, "Plugin installed");
        self.refresh();
        Ok(record)
    }

    /// Enables or disables a folder. Returns `false` for unknown folders.
    pub async fn set_enabled(&self, folder: &str, enabled: bool, updated_by: i64) -> AppResult<bool> {
        let changed = self.store.set_enabled(folder, enabled, updated_by).await?;
        if changed {
            info!(folder = %folder, enabled, "Plugin status changed");
        }
        self.refresh();
        Ok(changed)
    }

    /// Binds a folder to a hook.
    pub async fn bind_hook(&self, folder: &str, hook: &str, updated_by: i64) -> AppResult<HookBinding> {
        let binding = self.store.bind_hook(folder, hook, updated_by).await?;
        info!(folder = %folder, hook = %hook, order = binding.id, "Hook bound");
        self.refresh();
        Ok(binding)
    }

    /// Hooks a folder is bound to, in binding order.
    pub async fn hook_bindings(&self, folder: &str) -> AppResult<Vec<HookBinding>> {
        self.store.hook_bindings(folder).await
    }

    /// Removes a folder from a hook. Returns `false` when it was not bound.
    pub async fn unbind_hook(&self, folder: &str, hook: &str) -> AppResult<bool> {
        let removed = self.store.unbind_hook(folder, hook).await?;
        if removed {
            info!(folder = %folder, hook = %hook, "Hook unbound");
        }
        Ok(removed)
    }
}

/// Violations of the metadata invariants: duplicate enabled classes,
/// dangling parents, override cycles and parents with several enabled
/// children.
fn integrity_problems(plugins: &[PluginRecord]) -> Vec<String> {
    let mut problems = Vec::new();
    let enabled: Vec<&PluginRecord> = plugins.iter().filter(|p| p.enabled).collect();

    let mut by_class: HashMap<&str, Vec<&str>> = HashMap::new();
    for plugin in &enabled {
        by_class
            .entry(plugin.class.as_str())
            .or_default()
            .push(plugin.folder.as_str());
    }
    let mut duplicates: Vec<_> = by_class.iter().filter(|(_, f)| f.len() > 1).collect();
    duplicates.sort();
    for (class, folders) in duplicates {
        problems.push(format!(
            "class '{class}' is declared by several enabled plugins: {}",
            folders.join(", ")
        ));
    }

    let known: HashSet<&str> = plugins.iter().map(|p| p.class.as_str()).collect();
    for plugin in plugins {
        if let Some(parent) = plugin.parent_class() {
            if !known.contains(parent) {
                problems.push(format!(
                    "plugin '{}' extends unknown class '{parent}'",
                    plugin.folder
                ));
            }
        }
    }

    let parents: HashMap<&str, &str> = plugins
        .iter()
        .filter_map(|p| p.parent_class().map(|parent| (p.class.as_str(), parent)))
        .collect();
    for plugin in plugins {
        let mut seen = HashSet::new();
        let mut current = plugin.class.as_str();
        while let Some(&parent) = parents.get(current) {
            if !seen.insert(current) {
                break;
            }
            if parent == plugin.class {
                problems.push(format!(
                    "plugin '{}' is part of an override cycle",
                    plugin.folder
                ));
                break;
            }
            current = parent;
        }
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for plugin in &enabled {
        if let Some(parent) = plugin.parent_class() {
            children.entry(parent).or_default().push(plugin.folder.as_str());
        }
    }
    let mut crowded: Vec<_> = children.iter().filter(|(_, c)| c.len() > 1).collect();
    crowded.sort();
    for (parent, folders) in crowded {
        problems.push(format!(
            "class '{parent}' has several enabled children: {}",
            folders.join(", ")
        ));
    }

    problems
}
