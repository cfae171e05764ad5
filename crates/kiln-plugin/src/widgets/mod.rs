//! Widget registry: plugin-registered widgets and their persisted placement.

pub mod registry;
pub mod settings;

pub use registry::WidgetRegistry;
pub use settings::{OwnerState, highest_block, merge, ordered};
