//! Widget row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A widget registered by a plugin. `function` is the widget's identity;
/// the `(plugin, function, args)` triple is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WidgetRecord {
    /// Row identifier.
    #[sqlx(rename = "widget_id")]
    pub id: i64,
    /// Owning plugin folder.
    #[sqlx(rename = "widget_plugin")]
    pub plugin: String,
    /// Widget function name.
    #[sqlx(rename = "widget_function")]
    pub function: String,
    /// Opaque argument payload handed to the widget function.
    #[sqlx(rename = "widget_args")]
    pub args: String,
    /// Last write time.
    #[sqlx(rename = "widget_updatedts")]
    pub updated_at: DateTime<Utc>,
    /// User who registered the widget.
    #[sqlx(rename = "widget_updateby")]
    pub updated_by: i64,
}
