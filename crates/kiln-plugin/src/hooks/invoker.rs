//! Hook invoker: runs one dispatch target's hook method.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use kiln_core::error::AppError;
use kiln_core::result::AppResult;
use kiln_entity::user::CurrentUser;

use super::definitions::{DispatchTarget, is_truthy};
use crate::api::context::{HostServices, PluginContext, PluginProfile};
use crate::catalog::ClassTable;
use crate::defaults::DefaultHooks;
use crate::registry::PluginRegistry;

/// Instantiates handler classes and calls their hook methods.
#[derive(Debug, Clone)]
pub struct HookInvoker {
    registry: Arc<PluginRegistry>,
    classes: Arc<ClassTable>,
    defaults: Arc<DefaultHooks>,
    services: HostServices,
    user: CurrentUser,
}

impl HookInvoker {
    /// Creates an invoker.
    pub fn new(
        registry: Arc<PluginRegistry>,
        classes: Arc<ClassTable>,
        defaults: Arc<DefaultHooks>,
        services: HostServices,
        user: CurrentUser,
    ) -> Self {
        Self {
            registry,
            classes,
            defaults,
            services,
            user,
        }
    }

    /// Invokes `hook` on `target`.
    ///
    /// Runs the class's own or inherited method, else the host default.
    /// Returns `None` when the result is falsy. Fails with `Plugin` when the
    /// class is not loaded and `DataIntegrity` when neither the class nor
    /// the host implements the hook.
    pub async fn invoke(
        &self,
        target: &DispatchTarget,
        hook: &str,
        params: &Value,
    ) -> AppResult<Option<Value>> {
        let instance = self.classes.instantiate(&target.class).ok_or_else(|| {
            AppError::plugin(format!(
                "Class '{}' of plugin '{}' is not loaded",
                target.class, target.folder
            ))
        })?;

        let result = match instance.method(hook) {
            Some(method) => {
                let folder = if method.origin == target.class {
                    target.folder.clone()
                } else {
                    self.registry
                        .find_folder_by_class(&method.origin)
                        .await?
                        .unwrap_or_else(|| target.folder.clone())
                };
                debug!(
                    hook = %hook,
                    class = %target.class,
                    origin = %method.origin,
                    folder = %folder,
                    "Invoking plugin hook method"
                );
                let ctx = self.context_for(&folder, hook).await?;
                method.handler.handle(&ctx, params).await?
            }
            None => {
                let default = self.defaults.get(hook).ok_or_else(|| {
                    AppError::data_integrity(format!(
                        "Hook '{hook}' is implemented by neither class '{}' nor the host",
                        target.class
                    ))
                })?;
                debug!(hook = %hook, class = %target.class, "Invoking host default hook");
                let ctx = self.context_for(&target.folder, hook).await?;
                default.handle(&ctx, params).await?
            }
        };

        Ok(is_truthy(&result).then_some(result))
    }

    /// Builds a fresh context whose profile describes `folder`. A folder
    /// without metadata gets a profile carrying only its name.
    async fn context_for(&self, folder: &str, hook: &str) -> AppResult<PluginContext> {
        let profile = match self.registry.find_metadata_by_folder(folder).await? {
            Some(record) => PluginProfile::from(&record),
            None => PluginProfile::folder_only(folder),
        };
        Ok(PluginContext::new(
            profile,
            hook,
            self.user.clone(),
            self.services.clone(),
        ))
    }
}
