//! Shared test helpers for integration tests.

use std::path::Path;

use serde_json::json;
use sqlx::SqlitePool;
use tempfile::TempDir;

use kiln_core::config::PluginConfig;
use kiln_database::DatabasePool;
use kiln_database::migration::run_migrations;
use kiln_entity::plugin::NewPlugin;
use kiln_entity::user::CurrentUser;
use kiln_plugin::api::HostServices;
use kiln_plugin::manager::PluginManagerBuilder;
use kiln_plugin::{DefaultHooks, PluginClass, PluginManager};

/// Test host context
pub struct TestHost {
    /// Plugin host under test
    pub manager: PluginManager,
    /// Services the manager runs against
    pub services: HostServices,
    /// Database pool for direct queries
    pub pool: SqlitePool,
    /// Plugin code directory, removed on drop
    pub plugins_dir: TempDir,
}

impl TestHost {
    /// Host with the `core`/`ext` override chain installed and bound to
    /// `onSave`.
    pub async fn with_override_chain() -> Self {
        let host = Self::build(|builder| {
            builder
                .with_class("core", core_handler())
                .with_class("ext", ext_handler())
        })
        .await;

        host.install("core", NewPlugin::new("core", "CoreHandler"), &["onSave"])
            .await;
        host.install(
            "ext",
            NewPlugin::new("ext", "ExtHandler").extends("CoreHandler"),
            &["onSave"],
        )
        .await;
        host
    }

    /// Host over a fresh database, with classes configured by `configure`.
    pub async fn build<F>(configure: F) -> Self
    where
        F: FnOnce(PluginManagerBuilder) -> PluginManagerBuilder,
    {
        let db = DatabasePool::in_memory()
            .await
            .expect("Failed to open test database");
        run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");
        let pool = db.into_pool();

        let plugins_dir = TempDir::new().expect("Failed to create plugin dir");
        let services = HostServices::sqlite(pool.clone());
        let config = PluginConfig {
            directory: plugins_dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };

        let builder = PluginManager::builder(services.clone())
            .plugin_config(config)
            .user(CurrentUser::new(7, "tester"))
            .defaults(
                DefaultHooks::new()
                    .with_fn("onRender", |ctx, _p| async move {
                        Ok(json!(format!("default:{}", ctx.folder())))
                    }),
            );

        Self {
            manager: configure(builder).build(),
            services,
            pool,
            plugins_dir,
        }
    }

    /// Installs a plugin row, writes its code unit and binds it to `hooks`.
    pub async fn install(&self, folder: &str, plugin: NewPlugin, hooks: &[&str]) {
        write_code(self.plugins_dir.path(), folder);
        self.install_without_code(plugin, hooks).await;
    }

    /// Installs and binds a plugin whose code unit is absent.
    pub async fn install_without_code(&self, plugin: NewPlugin, hooks: &[&str]) {
        let folder = plugin.folder.clone();
        self.manager
            .install(&plugin)
            .await
            .expect("Failed to install plugin");
        for hook in hooks {
            self.manager
                .bind_hook(&folder, hook)
                .await
                .expect("Failed to bind hook");
        }
    }
}

/// Creates the code unit `{dir}/{folder}/{folder}.plugin`.
pub fn write_code(dir: &Path, folder: &str) {
    let folder_dir = dir.join(folder);
    std::fs::create_dir_all(&folder_dir).expect("Failed to create folder");
    std::fs::write(folder_dir.join(format!("{folder}.plugin")), "")
        .expect("Failed to write code unit");
}

/// Base class: implements `onSave` and `onLoad`.
pub fn core_handler() -> PluginClass {
    PluginClass::new("CoreHandler")
        .on_fn("onSave", |_ctx, _p| async { Ok(json!("core")) })
        .on_fn("onLoad", |ctx, _p| async move { Ok(json!(ctx.folder())) })
}

/// Overrides `onSave` only.
pub fn ext_handler() -> PluginClass {
    PluginClass::new("ExtHandler")
        .extends("CoreHandler")
        .on_fn("onSave", |ctx, p| async move {
            Ok(json!({ "folder": ctx.folder(), "params": p }))
        })
}
