//! Hook dispatcher: resolve a hook, invoke every target, aggregate results.
//!
//! Dispatch never fails. A target that cannot be instantiated or whose
//! handler errors is logged and skipped; a storage failure while resolving
//! is logged and yields no results.

use serde_json::Value;
use tracing::{debug, error, warn};

use kiln_core::error::ErrorKind;

use super::definitions::{HookResults, result_key};
use super::invoker::HookInvoker;
use super::resolver::HookResolver;

/// Runs the resolve + invoke loop for a hook.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    resolver: HookResolver,
    invoker: HookInvoker,
}

impl HookDispatcher {
    /// Creates a dispatcher.
    pub fn new(resolver: HookResolver, invoker: HookInvoker) -> Self {
        Self { resolver, invoker }
    }

    /// Fires `hook`, optionally only for one plugin folder and never for the
    /// folders in `exclude`.
    ///
    /// Returns `None` when no handler contributed a truthy result.
    pub async fn plugin_hook(
        &self,
        hook: &str,
        folder: Option<&str>,
        params: &Value,
        exclude: &[String],
    ) -> Option<HookResults> {
        let targets = match self.resolver.resolve(hook, folder, exclude).await {
            Ok(targets) => targets,
            Err(e) => {
                error!(hook = %hook, error = %e, "Failed to resolve hook");
                return None;
            }
        };

        let mut results = HookResults::new();
        for target in &targets {
            match self.invoker.invoke(target, hook, params).await {
                Ok(Some(value)) => {
                    let key = result_key(&target.class, hook);
                    if !results.insert(key.clone(), value) {
                        error!(
                            hook = %hook,
                            key = %key,
                            folder = %target.folder,
                            "Data integrity violation: duplicate result key, keeping first"
                        );
                    }
                }
                Ok(None) => {
                    debug!(hook = %hook, class = %target.class, "Handler made no contribution");
                }
                Err(e) if e.is(ErrorKind::Plugin) => {
                    warn!(
                        hook = %hook,
                        folder = %target.folder,
                        class = %target.class,
                        error = %e,
                        "Failed to instantiate plugin, skipping"
                    );
                }
                Err(e) => {
                    error!(
                        hook = %hook,
                        folder = %target.folder,
                        class = %target.class,
                        error = %e,
                        "Hook handler failed"
                    );
                }
            }
        }

        debug!(hook = %hook, targets = targets.len(), results = results.len(), "Hook dispatched");
        (!results.is_empty()).then_some(results)
    }

    /// The resolver.
    pub fn resolver(&self) -> &HookResolver {
        &self.resolver
    }
}
