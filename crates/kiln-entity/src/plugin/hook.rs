//! Hook binding models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A plugin's participation in a hook. `id` is the insertion order that
/// drives dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HookBinding {
    /// Insertion order (`phook_id`).
    #[sqlx(rename = "phook_id")]
    pub id: i64,
    /// Owning plugin folder.
    #[sqlx(rename = "plugin_folder")]
    pub folder: String,
    /// Hook name.
    #[sqlx(rename = "plugin_hook")]
    pub hook: String,
}

/// One row of the hook candidate query: a binding joined with the plugin
/// metadata the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HookCandidate {
    /// Binding insertion order.
    #[sqlx(rename = "phook_id")]
    pub binding_id: i64,
    /// Whether the plugin is active.
    #[sqlx(rename = "plugin_enabled")]
    pub enabled: bool,
    /// Plugin folder.
    #[sqlx(rename = "plugin_folder")]
    pub folder: String,
    /// Handler class name.
    #[sqlx(rename = "plugin_class")]
    pub class: String,
    /// Parent class name (empty for none).
    #[sqlx(rename = "plugin_extends")]
    pub extends: String,
    /// Type tag.
    #[sqlx(rename = "plugin_type")]
    pub plugin_type: String,
    /// Hook name.
    #[sqlx(rename = "plugin_hook")]
    pub hook: String,
}

impl HookCandidate {
    /// The parent class, if this candidate overrides one.
    pub fn parent_class(&self) -> Option<&str> {
        if self.extends.is_empty() {
            None
        } else {
            Some(&self.extends)
        }
    }
}
