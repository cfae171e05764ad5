//! Host default hook implementations.
//!
//! When a dispatched class has no method for a hook, the host's own
//! implementation of that hook runs instead.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Value, json};

use kiln_core::result::AppResult;

use crate::api::context::PluginContext;
use crate::traits::{ClosureHandler, HookHandler};

/// Hook name → host default implementation.
#[derive(Debug, Clone, Default)]
pub struct DefaultHooks {
    handlers: HashMap<String, Arc<dyn HookHandler>>,
}

impl DefaultHooks {
    /// Creates an empty set of defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults every host ships with.
    ///
    /// `admin_sidebar_plugin_settings` yields the link a settings sidebar
    /// shows for the plugin; `header_include` yields the stylesheet and
    /// script paths inside the plugin folder.
    pub fn host() -> Self {
        Self::new()
            .with_fn("admin_sidebar_plugin_settings", |ctx, _params| async move {
                let label = if ctx.profile.name.is_empty() {
                    ctx.folder().to_string()
                } else {
                    ctx.profile.name.clone()
                };
                Ok(json!({ "folder": ctx.folder(), "label": label }))
            })
            .with_fn("header_include", |ctx, _params| async move {
                let folder = ctx.folder();
                Ok(json!({
                    "css": format!("{folder}/css/{folder}.css"),
                    "js": format!("{folder}/javascript/{folder}.js"),
                }))
            })
    }

    /// Registers a default implementation.
    pub fn with(mut self, hook: impl Into<String>, handler: Arc<dyn HookHandler>) -> Self {
        self.handlers.insert(hook.into(), handler);
        self
    }

    /// Registers a default implementation from a closure.
    pub fn with_fn<F, Fut>(self, hook: impl Into<String>, handler: F) -> Self
    where
        F: Fn(PluginContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        self.with(hook, Arc::new(ClosureHandler::new(handler)))
    }

    /// The default for `hook`, if the host implements one.
    pub fn get(&self, hook: &str) -> Option<&Arc<dyn HookHandler>> {
        self.handlers.get(hook)
    }

    /// Hooks with a host default.
    pub fn hooks(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let defaults = DefaultHooks::new()
            .with_fn("header", |_ctx, _params| async { Ok(json!("<header>")) });
        assert!(defaults.get("header").is_some());
        assert!(defaults.get("footer").is_none());
        assert_eq!(defaults.hooks().collect::<Vec<_>>(), vec!["header"]);
    }

    #[test]
    fn test_host_defaults() {
        let defaults = DefaultHooks::host();
        let mut hooks = defaults.hooks().collect::<Vec<_>>();
        hooks.sort_unstable();
        assert_eq!(hooks, vec!["admin_sidebar_plugin_settings", "header_include"]);
    }
}
