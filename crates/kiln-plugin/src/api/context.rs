//! Plugin context: the identity and services handed to a hook handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use kiln_core::result::AppResult;
use kiln_entity::plugin::{HookBinding, HookCandidate, NewPlugin, PluginRecord};
use kiln_entity::user::CurrentUser;
use kiln_entity::widget::WidgetRecord;

/// Context passed to a handler for one invocation.
///
/// A fresh context is built for every dispatch target, so nothing a
/// handler observes leaks into the next one.
#[derive(Clone)]
pub struct PluginContext {
    /// Profile of the plugin whose code is running.
    pub profile: PluginProfile,
    /// Hook being dispatched.
    pub hook: String,
    /// Identity driving the request.
    pub user: CurrentUser,
    /// Host services.
    pub services: HostServices,
}

impl PluginContext {
    /// Creates a context for one invocation.
    pub fn new(
        profile: PluginProfile,
        hook: impl Into<String>,
        user: CurrentUser,
        services: HostServices,
    ) -> Self {
        Self {
            profile,
            hook: hook.into(),
            user,
            services,
        }
    }

    /// Folder of the plugin whose code is running.
    pub fn folder(&self) -> &str {
        &self.profile.folder
    }

    /// Reads a setting from this plugin's own namespace.
    pub async fn setting(&self, name: &str) -> AppResult<Option<String>> {
        self.services.settings.get(&self.profile.folder, name).await
    }

    /// Writes a setting into this plugin's own namespace.
    pub async fn set_setting(&self, name: &str, value: &str) -> AppResult<()> {
        self.services
            .settings
            .set(&self.profile.folder, name, value, self.user.id)
            .await
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("profile", &self.profile)
            .field("hook", &self.hook)
            .field("user", &self.user)
            .finish()
    }
}

/// The plugin identity fields a handler can introspect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginProfile {
    pub folder: String,
    pub id: i64,
    pub enabled: bool,
    pub name: String,
    pub class: String,
    pub extends: String,
    pub plugin_type: String,
    pub description: String,
    pub version: String,
    pub order: i64,
    pub author: String,
    pub author_url: String,
}

impl PluginProfile {
    /// A profile that only knows its folder (metadata lookup missed).
    pub fn folder_only(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            ..Default::default()
        }
    }
}

impl From<&PluginRecord> for PluginProfile {
    fn from(record: &PluginRecord) -> Self {
        Self {
            folder: record.folder.clone(),
            id: record.id,
            enabled: record.enabled,
            name: record.name.clone(),
            class: record.class.clone(),
            extends: record.extends.clone(),
            plugin_type: record.plugin_type.clone(),
            description: record.description.clone(),
            version: record.version.clone(),
            order: record.order,
            author: record.author.clone(),
            author_url: record.author_url.clone(),
        }
    }
}

/// Shared services reachable from a [`PluginContext`].
#[derive(Clone)]
pub struct HostServices {
    /// Plugin metadata and hook bindings.
    pub plugins: Arc<dyn PluginStore>,
    /// Widget rows.
    pub widgets: Arc<dyn WidgetStore>,
    /// Namespaced settings.
    pub settings: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish()
    }
}

// ── Service traits ──

/// Plugin metadata storage.
#[async_trait]
pub trait PluginStore: Send + Sync {
    /// Every plugin row, in one query.
    async fn all_plugins(&self) -> AppResult<Vec<PluginRecord>>;

    /// Stored enabled flag of a folder, `None` when not installed.
    async fn enabled_status(&self, folder: &str) -> AppResult<Option<bool>>;

    /// Number of enabled plugins.
    async fn count_enabled(&self) -> AppResult<u64>;

    /// Hook bindings joined with plugin metadata, in binding order.
    async fn hook_candidates(
        &self,
        hook: &str,
        folder: Option<&str>,
    ) -> AppResult<Vec<HookCandidate>>;

    /// Installs a plugin row.
    async fn install(&self, plugin: &NewPlugin, updated_by: i64) -> AppResult<PluginRecord>;

    /// Sets the enabled flag; `false` when the folder is unknown.
    async fn set_enabled(&self, folder: &str, enabled: bool, updated_by: i64) -> AppResult<bool>;

    /// Binds a folder to a hook (idempotent).
    async fn bind_hook(&self, folder: &str, hook: &str, updated_by: i64)
    -> AppResult<HookBinding>;

    /// Every binding of a folder, in binding order.
    async fn hook_bindings(&self, folder: &str) -> AppResult<Vec<HookBinding>>;

    /// Removes a binding; `false` when the folder was not bound to the hook.
    async fn unbind_hook(&self, folder: &str, hook: &str) -> AppResult<bool>;
}

/// Widget row storage.
#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// Whether the widgets relation exists.
    async fn relation_exists(&self) -> AppResult<bool>;

    /// Every widget row in insertion order.
    async fn list(&self) -> AppResult<Vec<WidgetRecord>>;

    /// Whether the exact triple is stored.
    async fn exists(&self, plugin: &str, function: &str, args: &str) -> AppResult<bool>;

    /// Inserts a row; `false` when the triple was already present.
    async fn insert(
        &self,
        plugin: &str,
        function: &str,
        args: &str,
        updated_by: i64,
    ) -> AppResult<bool>;

    /// Deletes every row of a function, returning the count removed.
    async fn delete_by_function(&self, function: &str) -> AppResult<u64>;

    /// Owning plugin of a function.
    async fn owner_of(&self, function: &str) -> AppResult<Option<String>>;

    /// Storage maintenance after writes.
    async fn optimize(&self) -> AppResult<()>;
}

/// Namespaced settings storage. Values are opaque strings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads a value.
    async fn get(&self, namespace: &str, name: &str) -> AppResult<Option<String>>;

    /// Writes a value.
    async fn set(&self, namespace: &str, name: &str, value: &str, updated_by: i64)
    -> AppResult<()>;
}
