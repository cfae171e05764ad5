//! Persisted settings entity.

pub mod model;

pub use model::SettingRow;
