//! # kiln-plugin
//!
//! Plugin host for Kiln. Provides:
//!
//! - Plugin metadata registry with a populate-once, refreshable cache
//! - Hook resolution with one-level parent/child overrides
//! - Hook invocation through a class table resolved at load time
//! - Code loaders (compiled-in catalog, optional `libloading` backend)
//! - Widget registry and the persisted widget settings merge

pub mod api;
pub mod catalog;
pub mod defaults;
pub mod hooks;
pub mod loader;
pub mod manager;
pub mod prelude;
pub mod registry;
pub mod traits;
pub mod widgets;

#[cfg(test)]
pub(crate) mod testing;

pub use api::context::PluginContext;
pub use catalog::ClassTable;
pub use defaults::DefaultHooks;
pub use hooks::definitions::{DispatchTarget, HookResults};
pub use hooks::dispatcher::HookDispatcher;
pub use hooks::invoker::HookInvoker;
pub use hooks::resolver::HookResolver;
pub use loader::{CodeLoader, StaticLoader};
pub use manager::PluginManager;
pub use registry::PluginRegistry;
pub use traits::{ClosureHandler, HookHandler, PluginClass};
pub use widgets::WidgetRegistry;
