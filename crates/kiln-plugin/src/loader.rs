//! Plugin code loaders.
//!
//! A plugin folder's code unit lives at `{directory}/{folder}/{folder}.{ext}`.
//! Loading a folder registers its classes in the [`ClassTable`]; loading the
//! same folder twice is a no-op.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashSet;
use tracing::info;

use kiln_core::config::PluginConfig;
use kiln_core::error::AppError;
use kiln_core::result::AppResult;

use crate::catalog::ClassTable;
use crate::traits::PluginClass;

/// Locates and loads plugin code units.
pub trait CodeLoader: Send + Sync + std::fmt::Debug {
    /// Path of the code unit for a folder.
    fn code_path(&self, folder: &str) -> PathBuf;

    /// Whether the code unit exists on disk.
    fn exists(&self, folder: &str) -> bool {
        self.code_path(folder).is_file()
    }

    /// Loads a folder's code, registering its classes. Idempotent.
    fn load(&self, folder: &str) -> AppResult<()>;

    /// Whether a folder has been loaded.
    fn is_loaded(&self, folder: &str) -> bool;
}

/// Loader for plugins compiled into the host binary.
///
/// Each folder maps to the classes it provides. The code unit on disk acts
/// as the install marker: a folder whose file is missing does not load.
#[derive(Debug)]
pub struct StaticLoader {
    config: PluginConfig,
    classes: Arc<ClassTable>,
    catalog: HashMap<String, Vec<PluginClass>>,
    loaded: DashSet<String>,
}

impl StaticLoader {
    /// Creates a loader with an empty catalog.
    pub fn new(config: PluginConfig, classes: Arc<ClassTable>) -> Self {
        Self {
            config,
            classes,
            catalog: HashMap::new(),
            loaded: DashSet::new(),
        }
    }

    /// Adds a class to a folder's code unit.
    pub fn with_class(mut self, folder: impl Into<String>, class: PluginClass) -> Self {
        self.catalog.entry(folder.into()).or_default().push(class);
        self
    }

    /// Folders present in the catalog.
    pub fn folders(&self) -> impl Iterator<Item = &str> {
        self.catalog.keys().map(String::as_str)
    }
}

impl CodeLoader for StaticLoader {
    fn code_path(&self, folder: &str) -> PathBuf {
        self.config.code_path(folder)
    }

    fn load(&self, folder: &str) -> AppResult<()> {
        if self.loaded.contains(folder) {
            return Ok(());
        }

        let path = self.code_path(folder);
        if !path.is_file() {
            return Err(AppError::plugin(format!(
                "Plugin code '{}' not found",
                path.display()
            )));
        }

        let classes = self.catalog.get(folder).ok_or_else(|| {
            AppError::plugin(format!("Plugin folder '{folder}' is not compiled into this host"))
        })?;

        for class in classes {
            self.classes.register(class.clone());
        }
        self.loaded.insert(folder.to_string());

        info!(folder = %folder, classes = classes.len(), "Plugin code loaded");
        Ok(())
    }

    fn is_loaded(&self, folder: &str) -> bool {
        self.loaded.contains(folder)
    }
}

#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    //! Loader for plugins built as shared libraries.

    use std::path::PathBuf;
    use std::sync::Arc;

    use dashmap::DashMap;
    use tracing::info;

    use kiln_core::config::PluginConfig;
    use kiln_core::error::AppError;
    use kiln_core::result::AppResult;

    use super::CodeLoader;
    use crate::catalog::ClassTable;
    use crate::traits::PluginClass;

    /// Symbol every dynamic plugin must export.
    pub const ENTRY_SYMBOL: &[u8] = b"kiln_plugin_classes";

    /// Type of the entry function exported by dynamic plugins.
    ///
    /// The library must be built with the same compiler and `kiln-plugin`
    /// version as the host.
    pub type PluginEntryFn = unsafe extern "Rust" fn() -> Vec<PluginClass>;

    /// Loads plugin code units as shared libraries (.so / .dll / .dylib).
    pub struct DynamicLoader {
        config: PluginConfig,
        classes: Arc<ClassTable>,
        /// Loaded libraries, kept alive for the lifetime of the loader.
        libraries: DashMap<String, libloading::Library>,
    }

    impl DynamicLoader {
        /// Creates a dynamic loader.
        pub fn new(config: PluginConfig, classes: Arc<ClassTable>) -> Self {
            Self {
                config,
                classes,
                libraries: DashMap::new(),
            }
        }
    }

    impl CodeLoader for DynamicLoader {
        fn code_path(&self, folder: &str) -> PathBuf {
            self.config.code_path(folder)
        }

        fn load(&self, folder: &str) -> AppResult<()> {
            if self.libraries.contains_key(folder) {
                return Ok(());
            }

            let path = self.code_path(folder);

            // SAFETY: loading a library runs its initialisers; only trusted
            // plugin directories may be configured.
            let library = unsafe { libloading::Library::new(&path) }.map_err(|e| {
                AppError::plugin(format!(
                    "Failed to load plugin library '{}': {e}",
                    path.display()
                ))
            })?;

            // SAFETY: the entry symbol is declared with `PluginEntryFn`'s signature.
            let classes = unsafe {
                let entry: libloading::Symbol<PluginEntryFn> =
                    library.get(ENTRY_SYMBOL).map_err(|e| {
                        AppError::plugin(format!(
                            "Plugin '{}' missing 'kiln_plugin_classes' symbol: {e}",
                            path.display()
                        ))
                    })?;
                entry()
            };

            let count = classes.len();
            for class in classes {
                self.classes.register(class);
            }
            self.libraries.insert(folder.to_string(), library);

            info!(path = %path.display(), classes = count, "Dynamic plugin loaded");
            Ok(())
        }

        fn is_loaded(&self, folder: &str) -> bool {
            self.libraries.contains_key(folder)
        }
    }

    impl std::fmt::Debug for DynamicLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicLoader")
                .field("directory", &self.config.directory)
                .field("loaded_count", &self.libraries.len())
                .finish()
        }
    }
}

#[cfg(feature = "dynamic")]
pub use dynamic_loader::DynamicLoader;
