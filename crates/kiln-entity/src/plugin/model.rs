//! Plugin metadata model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One installed plugin, as stored in the `plugins` table.
///
/// `folder` is unique and doubles as the locator of the plugin's code unit.
/// `class` is unique among enabled rows; `extends`, when non-empty, names
/// the class this plugin overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PluginRecord {
    /// Row identifier.
    #[sqlx(rename = "plugin_id")]
    pub id: i64,
    /// Whether the plugin is active.
    #[sqlx(rename = "plugin_enabled")]
    pub enabled: bool,
    /// Human-readable name.
    #[sqlx(rename = "plugin_name")]
    pub name: String,
    /// Unique folder name.
    #[sqlx(rename = "plugin_folder")]
    pub folder: String,
    /// Handler class name.
    #[sqlx(rename = "plugin_class")]
    pub class: String,
    /// Parent class name, empty when the plugin overrides nothing.
    #[sqlx(rename = "plugin_extends")]
    pub extends: String,
    /// Free-form type tag (e.g. `avatar`).
    #[sqlx(rename = "plugin_type")]
    pub plugin_type: String,
    /// Description.
    #[sqlx(rename = "plugin_desc")]
    pub description: String,
    /// Version string.
    #[sqlx(rename = "plugin_version")]
    pub version: String,
    /// Administrative ordering.
    #[sqlx(rename = "plugin_order")]
    pub order: i64,
    /// Author name.
    #[sqlx(rename = "plugin_author")]
    pub author: String,
    /// Author website.
    #[sqlx(rename = "plugin_authorurl")]
    pub author_url: String,
}

impl PluginRecord {
    /// The parent class, if this plugin overrides one.
    pub fn parent_class(&self) -> Option<&str> {
        if self.extends.is_empty() {
            None
        } else {
            Some(&self.extends)
        }
    }
}

/// Data required to install a plugin row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPlugin {
    /// Unique folder name.
    pub folder: String,
    /// Handler class name.
    pub class: String,
    /// Parent class name (empty for none).
    pub extends: String,
    /// Whether the plugin starts enabled.
    pub enabled: bool,
    /// Human-readable name.
    pub name: String,
    /// Type tag.
    pub plugin_type: String,
    /// Description.
    pub description: String,
    /// Version string.
    pub version: String,
    /// Administrative ordering.
    pub order: i64,
    /// Author name.
    pub author: String,
    /// Author website.
    pub author_url: String,
}

impl NewPlugin {
    /// Start describing an enabled plugin with the given folder and class.
    pub fn new(folder: impl Into<String>, class: impl Into<String>) -> Self {
        let folder = folder.into();
        Self {
            name: folder.clone(),
            folder,
            class: class.into(),
            enabled: true,
            version: "0.1".to_string(),
            ..Default::default()
        }
    }

    /// Declare the class this plugin overrides.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = parent.into();
        self
    }

    /// Set the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the type tag.
    pub fn plugin_type(mut self, plugin_type: impl Into<String>) -> Self {
        self.plugin_type = plugin_type.into();
        self
    }

    /// Set the human-readable name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the version string.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the author and author URL.
    pub fn author(mut self, author: impl Into<String>, url: impl Into<String>) -> Self {
        self.author = author.into();
        self.author_url = url.into();
        self
    }
}
