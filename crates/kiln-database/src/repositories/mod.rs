//! Concrete repository implementations.

pub mod hook;
pub mod plugin;
pub mod settings;
pub mod widget;

pub use hook::HookRepository;
pub use plugin::PluginRepository;
pub use settings::SettingsRepository;
pub use widget::WidgetRepository;
