//! Widget settings configuration.

use serde::{Deserialize, Serialize};

/// Where and how widget settings are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Settings namespace holding the widget document.
    #[serde(default = "default_namespace")]
    pub settings_namespace: String,
    /// Settings key of the widget document.
    #[serde(default = "default_key")]
    pub settings_key: String,
    /// Block assigned to newly discovered widgets.
    #[serde(default = "default_block")]
    pub default_block: i64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            settings_namespace: default_namespace(),
            settings_key: default_key(),
            default_block: default_block(),
        }
    }
}

fn default_namespace() -> String {
    "widgets".to_string()
}

fn default_key() -> String {
    "widgets_settings".to_string()
}

fn default_block() -> i64 {
    1
}
