//! Plugin system configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Plugin discovery and dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory holding one sub-directory per plugin folder.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Extension of a plugin's code unit: `{directory}/{folder}/{folder}.{ext}`.
    #[serde(default = "default_code_extension")]
    pub code_extension: String,
    /// Lifetime of the plugin metadata cache in seconds (0 = until refreshed).
    #[serde(default)]
    pub metadata_cache_ttl_seconds: u64,
}

impl PluginConfig {
    /// Path of the code unit for a plugin folder.
    pub fn code_path(&self, folder: &str) -> PathBuf {
        Path::new(&self.directory)
            .join(folder)
            .join(format!("{folder}.{}", self.code_extension))
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            code_extension: default_code_extension(),
            metadata_cache_ttl_seconds: 0,
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_code_extension() -> String {
    "plugin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_path_layout() {
        let config = PluginConfig {
            directory: "/srv/plugins".to_string(),
            code_extension: "so".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.code_path("sidebar"),
            PathBuf::from("/srv/plugins/sidebar/sidebar.so")
        );
    }
}
