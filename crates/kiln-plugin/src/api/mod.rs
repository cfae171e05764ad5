//! Plugin API: the per-dispatch context and the host services behind it.

pub mod context;
pub mod services;

pub use context::{HostServices, PluginContext, PluginProfile};
