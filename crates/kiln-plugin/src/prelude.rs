//! Prelude for convenient imports when writing plugins.

pub use async_trait::async_trait;
pub use serde_json::{Value, json};

pub use kiln_core::error::{AppError, ErrorKind};
pub use kiln_core::result::AppResult;

pub use crate::api::context::{PluginContext, PluginProfile};
pub use crate::hooks::definitions::HookResults;
pub use crate::traits::{ClosureHandler, HookHandler, PluginClass};
