//! Settings row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One persisted setting: an opaque serialized value under `(namespace, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettingRow {
    /// Row identifier.
    #[sqlx(rename = "settings_id")]
    pub id: i64,
    /// Namespace (usually the owning plugin folder, or `widgets`).
    #[sqlx(rename = "settings_plugin")]
    pub namespace: String,
    /// Setting name within the namespace.
    #[sqlx(rename = "settings_name")]
    pub name: String,
    /// Serialized value.
    #[sqlx(rename = "settings_value")]
    pub value: String,
    /// Last write time.
    #[sqlx(rename = "settings_updatedts")]
    pub updated_at: DateTime<Utc>,
    /// User who last wrote the value.
    #[sqlx(rename = "settings_updateby")]
    pub updated_by: i64,
}
