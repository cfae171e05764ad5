//! Hook resolver: which handlers run for a hook, and in what order.
//!
//! Candidates come from the hook bindings in insertion order. Overrides
//! are one level deep: a candidate with an enabled child anywhere in the
//! candidate set is skipped, so each override chain dispatches exactly
//! once, through its leaf.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use kiln_core::result::AppResult;
use kiln_entity::plugin::HookCandidate;

use super::definitions::DispatchTarget;
use crate::loader::CodeLoader;
use crate::registry::PluginRegistry;

/// A dispatch target together with the parent folders that must be loaded
/// before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTarget {
    /// The handler to dispatch.
    pub target: DispatchTarget,
    /// Folders of enabled candidates declaring the target's parent class.
    pub parents: Vec<String>,
}

/// Selects dispatch targets from the candidate rows of one hook.
///
/// Pure: file existence is asked through `code_exists`, nothing is loaded.
pub fn plan(
    hook: &str,
    candidates: &[HookCandidate],
    exclude: &[String],
    code_exists: impl Fn(&str) -> bool,
) -> Vec<PlannedTarget> {
    let mut planned = Vec::new();

    for candidate in candidates {
        if !candidate.enabled {
            debug!(hook = %hook, folder = %candidate.folder, "Skipping disabled plugin");
            continue;
        }
        if candidate.folder.is_empty() || candidate.hook.is_empty() {
            debug!(hook = %hook, binding = candidate.binding_id, "Skipping incomplete binding");
            continue;
        }
        if exclude.iter().any(|f| f == &candidate.folder) {
            debug!(hook = %hook, folder = %candidate.folder, "Skipping excluded plugin");
            continue;
        }
        if !code_exists(&candidate.folder) {
            warn!(hook = %hook, folder = %candidate.folder, "Plugin code file missing, skipping");
            continue;
        }

        let children: Vec<&HookCandidate> = candidates
            .iter()
            .filter(|other| other.enabled && other.extends == candidate.class)
            .collect();
        if !children.is_empty() {
            if children.iter().any(|c| c.folder == candidate.folder) {
                error!(
                    hook = %hook,
                    folder = %candidate.folder,
                    class = %candidate.class,
                    "Data integrity violation: class extends itself"
                );
            } else if children.len() > 1 {
                error!(
                    hook = %hook,
                    class = %candidate.class,
                    children = ?children.iter().map(|c| c.class.as_str()).collect::<Vec<_>>(),
                    "Data integrity violation: several enabled children override one parent"
                );
            }
            debug!(
                hook = %hook,
                folder = %candidate.folder,
                class = %candidate.class,
                "Skipping overridden parent"
            );
            continue;
        }

        let parents = match candidate.parent_class() {
            Some(parent) => candidates
                .iter()
                .filter(|other| other.enabled && other.class == parent)
                .map(|other| other.folder.clone())
                .collect(),
            None => Vec::new(),
        };

        planned.push(PlannedTarget {
            target: DispatchTarget {
                class: candidate.class.clone(),
                folder: candidate.folder.clone(),
                extends: candidate.extends.clone(),
            },
            parents,
        });
    }

    planned
}

/// Resolves hooks to loaded, override-resolved dispatch targets.
#[derive(Debug, Clone)]
pub struct HookResolver {
    registry: Arc<PluginRegistry>,
    loader: Arc<dyn CodeLoader>,
}

impl HookResolver {
    /// Creates a resolver.
    pub fn new(registry: Arc<PluginRegistry>, loader: Arc<dyn CodeLoader>) -> Self {
        Self { registry, loader }
    }

    /// Targets for `hook` without loading any code.
    pub async fn plan(
        &self,
        hook: &str,
        folder: Option<&str>,
        exclude: &[String],
    ) -> AppResult<Vec<PlannedTarget>> {
        if hook.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.registry.hook_candidates(hook, folder).await?;
        Ok(plan(hook, &candidates, exclude, |f| self.loader.exists(f)))
    }

    /// Resolves `hook` to dispatch targets in binding order, loading each
    /// target's code (parents first). Targets whose code fails to load are
    /// skipped.
    pub async fn resolve(
        &self,
        hook: &str,
        folder: Option<&str>,
        exclude: &[String],
    ) -> AppResult<Vec<DispatchTarget>> {
        let planned = self.plan(hook, folder, exclude).await?;
        if planned.is_empty() {
            debug!(hook = %hook, "No handlers for hook");
            return Ok(Vec::new());
        }

        let mut targets = Vec::with_capacity(planned.len());
        for PlannedTarget { target, mut parents } in planned {
            if parents.is_empty() && !target.extends.is_empty() {
                // Parent not bound to this hook: load it so inherited
                // methods resolve.
                parents.extend(self.enabled_folder_of(&target.extends).await?);
            }

            match self.load_with_parents(&parents, &target.folder) {
                Ok(()) => targets.push(target),
                Err(e) => warn!(
                    hook = %hook,
                    folder = %target.folder,
                    error = %e,
                    "Failed to load plugin code, skipping"
                ),
            }
        }

        Ok(targets)
    }

    async fn enabled_folder_of(&self, class: &str) -> AppResult<Option<String>> {
        let plugins = self.registry.all().await?;
        Ok(plugins
            .iter()
            .find(|p| p.enabled && p.class == class)
            .map(|p| p.folder.clone()))
    }

    fn load_with_parents(&self, parents: &[String], folder: &str) -> AppResult<()> {
        for parent in parents {
            self.loader.load(parent)?;
        }
        self.loader.load(folder)
    }
}
