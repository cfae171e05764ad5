//! Plugin manager: the request-scoped host that wires registry, resolver,
//! invoker, loader and widget registry together.

use std::sync::Arc;

use serde_json::Value;

use kiln_core::config::{PluginConfig, WidgetConfig};
use kiln_core::result::AppResult;
use kiln_entity::plugin::{HookBinding, NewPlugin, PluginRecord};
use kiln_entity::user::CurrentUser;

use crate::api::context::{HostServices, PluginProfile};
use crate::catalog::ClassTable;
use crate::defaults::DefaultHooks;
use crate::hooks::definitions::{DispatchTarget, HookResults};
use crate::hooks::dispatcher::HookDispatcher;
use crate::hooks::invoker::HookInvoker;
use crate::hooks::resolver::{HookResolver, PlannedTarget};
use crate::loader::{CodeLoader, StaticLoader};
use crate::registry::PluginRegistry;
use crate::traits::PluginClass;
use crate::widgets::WidgetRegistry;

type LoaderFactory = Box<dyn FnOnce(&PluginConfig, Arc<ClassTable>) -> Arc<dyn CodeLoader>>;

/// Builder for a [`PluginManager`].
pub struct PluginManagerBuilder {
    services: HostServices,
    plugin_config: PluginConfig,
    widget_config: WidgetConfig,
    user: CurrentUser,
    defaults: DefaultHooks,
    catalog: Vec<(String, PluginClass)>,
    loader: Option<LoaderFactory>,
}

impl PluginManagerBuilder {
    /// Sets the plugin configuration.
    pub fn plugin_config(mut self, config: PluginConfig) -> Self {
        self.plugin_config = config;
        self
    }

    /// Sets the widget configuration.
    pub fn widget_config(mut self, config: WidgetConfig) -> Self {
        self.widget_config = config;
        self
    }

    /// Sets the identity driving this request.
    pub fn user(mut self, user: CurrentUser) -> Self {
        self.user = user;
        self
    }

    /// Sets the host default hooks.
    pub fn defaults(mut self, defaults: DefaultHooks) -> Self {
        self.defaults = defaults;
        self
    }

    /// Adds a compiled-in class to a plugin folder.
    pub fn with_class(mut self, folder: impl Into<String>, class: PluginClass) -> Self {
        self.catalog.push((folder.into(), class));
        self
    }

    /// Replaces the compiled-in loader. The factory receives the plugin
    /// configuration and the class table the loader must register into.
    pub fn loader<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&PluginConfig, Arc<ClassTable>) -> Arc<dyn CodeLoader> + 'static,
    {
        self.loader = Some(Box::new(factory));
        self
    }

    /// Builds the manager.
    pub fn build(self) -> PluginManager {
        let classes = Arc::new(ClassTable::new());
        let loader: Arc<dyn CodeLoader> = match self.loader {
            Some(factory) => factory(&self.plugin_config, classes.clone()),
            None => {
                let mut loader = StaticLoader::new(self.plugin_config.clone(), classes.clone());
                for (folder, class) in self.catalog {
                    loader = loader.with_class(folder, class);
                }
                Arc::new(loader)
            }
        };

        let registry = Arc::new(PluginRegistry::new(
            self.services.plugins.clone(),
            &self.plugin_config,
        ));
        let resolver = HookResolver::new(registry.clone(), loader.clone());
        let invoker = HookInvoker::new(
            registry.clone(),
            classes.clone(),
            Arc::new(self.defaults),
            self.services.clone(),
            self.user.clone(),
        );
        let widgets = WidgetRegistry::new(
            self.services.widgets.clone(),
            self.services.settings.clone(),
            registry.clone(),
            self.widget_config,
            self.user.clone(),
        );

        PluginManager {
            registry,
            classes,
            loader,
            dispatcher: HookDispatcher::new(resolver, invoker),
            widgets,
            user: self.user,
        }
    }
}

/// The plugin host for one request or process.
#[derive(Debug, Clone)]
pub struct PluginManager {
    registry: Arc<PluginRegistry>,
    classes: Arc<ClassTable>,
    loader: Arc<dyn CodeLoader>,
    dispatcher: HookDispatcher,
    widgets: WidgetRegistry,
    user: CurrentUser,
}

impl PluginManager {
    /// Starts building a manager over the given services.
    pub fn builder(services: HostServices) -> PluginManagerBuilder {
        PluginManagerBuilder {
            services,
            plugin_config: PluginConfig::default(),
            widget_config: WidgetConfig::default(),
            user: CurrentUser::anonymous(),
            defaults: DefaultHooks::new(),
            catalog: Vec::new(),
            loader: None,
        }
    }

    /// Fires a hook. See [`HookDispatcher::plugin_hook`].
    pub async fn plugin_hook(
        &self,
        hook: &str,
        folder: Option<&str>,
        params: &Value,
        exclude: &[String],
    ) -> Option<HookResults> {
        self.dispatcher.plugin_hook(hook, folder, params, exclude).await
    }

    /// Resolves a hook to dispatch targets, loading their code.
    pub async fn resolve(
        &self,
        hook: &str,
        folder: Option<&str>,
        exclude: &[String],
    ) -> AppResult<Vec<DispatchTarget>> {
        self.dispatcher.resolver().resolve(hook, folder, exclude).await
    }

    /// Dispatch targets for a hook without loading code.
    pub async fn plan(
        &self,
        hook: &str,
        folder: Option<&str>,
        exclude: &[String],
    ) -> AppResult<Vec<PlannedTarget>> {
        self.dispatcher.resolver().plan(hook, folder, exclude).await
    }

    /// Profile of a plugin folder, `None` when it is not installed.
    pub async fn read_plugin(&self, folder: &str) -> AppResult<Option<PluginProfile>> {
        Ok(self
            .registry
            .find_metadata_by_folder(folder)
            .await?
            .as_ref()
            .map(PluginProfile::from))
    }

    /// Whether a plugin folder is enabled, read from storage.
    pub async fn is_active(&self, folder: &str) -> AppResult<bool> {
        self.registry.is_enabled(folder).await
    }

    /// Number of enabled plugins, `None` when there are none.
    pub async fn count_active(&self) -> AppResult<Option<u64>> {
        self.registry.count_enabled().await
    }

    /// Installs a plugin row as the current user.
    pub async fn install(&self, plugin: &NewPlugin) -> AppResult<PluginRecord> {
        self.registry.install(plugin, self.user.id).await
    }

    /// Enables or disables a plugin as the current user.
    pub async fn set_enabled(&self, folder: &str, enabled: bool) -> AppResult<bool> {
        self.registry.set_enabled(folder, enabled, self.user.id).await
    }

    /// Binds a plugin folder to a hook as the current user.
    pub async fn bind_hook(&self, folder: &str, hook: &str) -> AppResult<HookBinding> {
        self.registry.bind_hook(folder, hook, self.user.id).await
    }

    /// Hooks a plugin folder is bound to.
    pub async fn hook_bindings(&self, folder: &str) -> AppResult<Vec<HookBinding>> {
        self.registry.hook_bindings(folder).await
    }

    /// Removes a plugin folder from a hook.
    pub async fn unbind_hook(&self, folder: &str, hook: &str) -> AppResult<bool> {
        self.registry.unbind_hook(folder, hook).await
    }

    /// Drops cached plugin metadata.
    pub fn refresh(&self) {
        self.registry.refresh();
    }

    /// The plugin registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// The widget registry.
    pub fn widgets(&self) -> &WidgetRegistry {
        &self.widgets
    }

    /// The class table.
    pub fn classes(&self) -> &Arc<ClassTable> {
        &self.classes
    }

    /// The code loader.
    pub fn loader(&self) -> &Arc<dyn CodeLoader> {
        &self.loader
    }

    /// The identity driving this request.
    pub fn user(&self) -> &CurrentUser {
        &self.user
    }
}
