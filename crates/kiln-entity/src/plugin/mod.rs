//! Plugin metadata and hook binding entities.

pub mod hook;
pub mod model;

pub use hook::{HookBinding, HookCandidate};
pub use model::{NewPlugin, PluginRecord};
