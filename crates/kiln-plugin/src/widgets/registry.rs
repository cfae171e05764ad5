//! Widget registry over the widget store and the settings document.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use kiln_core::config::WidgetConfig;
use kiln_core::error::AppError;
use kiln_core::result::AppResult;
use kiln_entity::user::CurrentUser;
use kiln_entity::widget::{WidgetMap, WidgetRecord, WidgetSettings};

use super::settings::{self, OwnerState};
use crate::api::context::{SettingsStore, WidgetStore};
use crate::registry::PluginRegistry;

/// Registers widgets and maintains their persisted placement settings.
#[derive(Clone)]
pub struct WidgetRegistry {
    store: Arc<dyn WidgetStore>,
    settings: Arc<dyn SettingsStore>,
    plugins: Arc<PluginRegistry>,
    config: WidgetConfig,
    user: CurrentUser,
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("config", &self.config)
            .field("user", &self.user)
            .finish()
    }
}

impl WidgetRegistry {
    /// Creates a widget registry.
    pub fn new(
        store: Arc<dyn WidgetStore>,
        settings: Arc<dyn SettingsStore>,
        plugins: Arc<PluginRegistry>,
        config: WidgetConfig,
        user: CurrentUser,
    ) -> Self {
        Self {
            store,
            settings,
            plugins,
            config,
            user,
        }
    }

    /// Registers a widget. Returns `false` when the exact
    /// `(plugin, function, args)` row already exists.
    pub async fn add(&self, plugin: &str, function: &str, args: &str) -> AppResult<bool> {
        if plugin.is_empty() || function.is_empty() {
            return Err(AppError::validation("Widget plugin and function are required"));
        }

        if self.store.exists(plugin, function, args).await? {
            debug!(plugin = %plugin, function = %function, "Widget already registered");
            return Ok(false);
        }

        let inserted = self.store.insert(plugin, function, args, self.user.id).await?;
        self.store.optimize().await?;

        if inserted {
            info!(
                plugin = %plugin,
                function = %function,
                updated_by = self.user.id,
                "Widget registered"
            );
        }
        Ok(inserted)
    }

    /// Removes every row of a widget function. Returns the number removed.
    pub async fn delete(&self, function: &str) -> AppResult<u64> {
        let removed = self.store.delete_by_function(function).await?;
        self.store.optimize().await?;
        info!(function = %function, removed, "Widget deleted");
        Ok(removed)
    }

    /// All stored widget rows, or `None` if the widgets relation does not
    /// exist yet.
    pub async fn list_raw(&self) -> AppResult<Option<Vec<WidgetRecord>>> {
        if !self.store.relation_exists().await? {
            debug!("Widgets relation does not exist yet");
            return Ok(None);
        }
        Ok(Some(self.store.list().await?))
    }

    /// Merges the stored rows into the settings document and persists it.
    ///
    /// Returns the persisted document, or `None` when there are no widgets
    /// (nothing is written then).
    pub async fn initialize(&self) -> AppResult<Option<WidgetSettings>> {
        let records = match self.list_raw().await? {
            Some(records) if !records.is_empty() => records,
            _ => return Ok(None),
        };

        let mut document = self.load_settings().await?;
        let owners = self.owner_states(&records).await?;
        settings::merge(&mut document, &records, &owners, self.config.default_block);
        self.save_settings(&document).await?;

        info!(widgets = document.widgets.len(), "Widget settings initialized");
        Ok(Some(document))
    }

    /// Persisted widgets sorted by `order`, or `None` when there are none.
    pub async fn ordered_widgets(&self) -> AppResult<Option<WidgetMap>> {
        let document = self.load_settings().await?;
        if document.widgets.is_empty() {
            return Ok(None);
        }
        Ok(Some(settings::ordered(&document.widgets)))
    }

    /// Highest block used by `widgets` (at least 1).
    pub fn highest_block(widgets: &WidgetMap) -> i64 {
        settings::highest_block(widgets)
    }

    /// Plugin folder owning a widget function.
    pub async fn owner_of(&self, function: &str) -> AppResult<Option<String>> {
        self.store.owner_of(function).await
    }

    /// The persisted settings document, empty if never written.
    pub async fn load_settings(&self) -> AppResult<WidgetSettings> {
        let raw = self
            .settings
            .get(&self.config.settings_namespace, &self.config.settings_key)
            .await?;

        match raw {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw).map_err(|e| {
                warn!(error = %e, "Widget settings document is corrupt");
                AppError::from(e)
            }),
            _ => Ok(WidgetSettings::default()),
        }
    }

    async fn save_settings(&self, document: &WidgetSettings) -> AppResult<()> {
        let raw = serde_json::to_string(document)?;
        self.settings
            .set(
                &self.config.settings_namespace,
                &self.config.settings_key,
                &raw,
                self.user.id,
            )
            .await
    }

    async fn owner_states(
        &self,
        records: &[WidgetRecord],
    ) -> AppResult<HashMap<String, OwnerState>> {
        let mut owners = HashMap::new();
        for record in records {
            if owners.contains_key(&record.plugin) {
                continue;
            }
            let state = OwnerState {
                active: self.plugins.is_enabled(&record.plugin).await?,
                class: self.plugins.class_of(&record.plugin).await?,
            };
            owners.insert(record.plugin.clone(), state);
        }
        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::context::HostServices;
    use crate::testing::{sqlite_pool, sqlite_services};
    use kiln_core::config::PluginConfig;
    use kiln_core::error::ErrorKind;
    use kiln_entity::plugin::NewPlugin;
    use kiln_entity::widget::WidgetEntry;

    async fn setup() -> (WidgetRegistry, HostServices, Arc<PluginRegistry>) {
        let services = sqlite_services().await;
        let plugins = Arc::new(PluginRegistry::new(
            services.plugins.clone(),
            &PluginConfig::default(),
        ));
        let widgets = WidgetRegistry::new(
            services.widgets.clone(),
            services.settings.clone(),
            plugins.clone(),
            WidgetConfig::default(),
            CurrentUser::new(4, "admin"),
        );
        (widgets, services, plugins)
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (widgets, _, _) = setup().await;
        assert!(widgets.add("blog", "recent_posts", "").await.unwrap());
        assert!(!widgets.add("blog", "recent_posts", "").await.unwrap());

        let rows = widgets.list_raw().await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].updated_by, 4);
        assert_eq!(widgets.owner_of("recent_posts").await.unwrap().as_deref(), Some("blog"));
    }

    #[tokio::test]
    async fn test_add_requires_names() {
        let (widgets, _, _) = setup().await;
        let err = widgets.add("", "recent_posts", "").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_delete_removes_every_row() {
        let (widgets, _, _) = setup().await;
        widgets.add("blog", "recent_posts", "").await.unwrap();
        widgets.add("blog", "recent_posts", "limit=3").await.unwrap();
        assert_eq!(widgets.delete("recent_posts").await.unwrap(), 2);
        assert!(widgets.list_raw().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_without_widgets_writes_nothing() {
        let (widgets, services, _) = setup().await;
        assert!(widgets.initialize().await.unwrap().is_none());
        assert_eq!(
            services.settings.get("widgets", "widgets_settings").await.unwrap(),
            None
        );
        assert!(widgets.ordered_widgets().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_merges_and_persists() {
        let (widgets, services, plugins) = setup().await;
        plugins.install(&NewPlugin::new("blog", "Blog"), 0).await.unwrap();
        plugins
            .install(&NewPlugin::new("tags", "Tags").enabled(false), 0)
            .await
            .unwrap();
        widgets.add("blog", "recent_posts", "").await.unwrap();
        widgets.add("tags", "tag_cloud", "").await.unwrap();

        let mut customised = WidgetSettings::default();
        customised.widgets.insert(
            "tag_cloud",
            WidgetEntry {
                order: Some(0),
                enabled: Some(true),
                ..Default::default()
            },
        );
        services
            .settings
            .set("widgets", "widgets_settings", &serde_json::to_string(&customised).unwrap(), 0)
            .await
            .unwrap();

        let document = widgets.initialize().await.unwrap().unwrap();
        let cloud = document.widgets.get("tag_cloud").unwrap();
        assert_eq!(cloud.order, Some(0));
        assert_eq!(cloud.enabled, Some(false));
        assert_eq!(cloud.class.as_deref(), Some("Tags"));

        let ordered = widgets.ordered_widgets().await.unwrap().unwrap();
        assert_eq!(ordered.keys().collect::<Vec<_>>(), vec!["tag_cloud", "recent_posts"]);
        assert_eq!(WidgetRegistry::highest_block(&ordered), 1);
    }

    #[tokio::test]
    async fn test_missing_relation_lists_nothing() {
        let pool = sqlite_pool().await;
        sqlx::query("DROP TABLE widgets").execute(&pool).await.unwrap();
        let services = HostServices::sqlite(pool);
        let plugins = Arc::new(PluginRegistry::new(
            services.plugins.clone(),
            &PluginConfig::default(),
        ));
        let widgets = WidgetRegistry::new(
            services.widgets.clone(),
            services.settings.clone(),
            plugins,
            WidgetConfig::default(),
            CurrentUser::anonymous(),
        );
        assert!(widgets.list_raw().await.unwrap().is_none());
        assert!(widgets.initialize().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let (widgets, services, _) = setup().await;
        services
            .settings
            .set("widgets", "widgets_settings", "not json", 0)
            .await
            .unwrap();
        let err = widgets.ordered_widgets().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }
}
