//! Widget entities: stored widget rows and the persisted settings document.

pub mod model;
pub mod settings;

pub use model::WidgetRecord;
pub use settings::{WidgetEntry, WidgetMap, WidgetSettings};
