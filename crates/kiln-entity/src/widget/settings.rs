//! The persisted widget settings document.
//!
//! The document is a mapping from widget function name to a
//! [`WidgetEntry`]. Entry order is significant (it breaks ties when
//! sorting by `order`), so the mapping is kept as an ordered list and
//! (de)serialized as a JSON object in insertion order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placement and identity of one widget.
///
/// Placement fields are optional so that "never set" can be told apart
/// from an administrator's explicit choice when settings are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetEntry {
    /// Sort position.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Placement bucket.
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub block: Option<i64>,
    /// Whether the widget renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Owning plugin folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Handler class of the owning plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Widget function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Argument payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    /// Keys written by other tooling, carried through merges untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WidgetEntry {
    /// Sort key; entries without a usable order sort first.
    pub fn sort_order(&self) -> i64 {
        self.order.unwrap_or(0)
    }

    /// Whether the widget should render.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

/// Insertion-ordered mapping from widget function name to entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetMap {
    entries: Vec<(String, WidgetEntry)>,
}

impl WidgetMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry.
    pub fn get(&self, function: &str) -> Option<&WidgetEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == function)
            .map(|(_, entry)| entry)
    }

    /// Mutable entry for `function`, appended with defaults when absent.
    pub fn entry(&mut self, function: &str) -> &mut WidgetEntry {
        let index = match self.entries.iter().position(|(name, _)| name == function) {
            Some(index) => index,
            None => {
                self.entries
                    .push((function.to_string(), WidgetEntry::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Insert or replace an entry, keeping its position if it existed.
    pub fn insert(&mut self, function: impl Into<String>, entry: WidgetEntry) {
        let function = function.into();
        *self.entry(&function) = entry;
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WidgetEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Function names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Stable sort by `order`, ascending. Ties keep their current order.
    pub fn sort_by_order(&mut self) {
        self.entries.sort_by_key(|(_, entry)| entry.sort_order());
    }
}

impl FromIterator<(String, WidgetEntry)> for WidgetMap {
    fn from_iter<T: IntoIterator<Item = (String, WidgetEntry)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (function, entry) in iter {
            map.insert(function, entry);
        }
        map
    }
}

impl IntoIterator for WidgetMap {
    type Item = (String, WidgetEntry);
    type IntoIter = std::vec::IntoIter<(String, WidgetEntry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for WidgetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (function, entry) in &self.entries {
            map.serialize_entry(function, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WidgetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WidgetMapVisitor;

        impl<'de> Visitor<'de> for WidgetMapVisitor {
            type Value = WidgetMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of widget function names to widget settings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<WidgetMap, A::Error> {
                let mut map = WidgetMap::new();
                while let Some((function, entry)) = access.next_entry::<String, WidgetEntry>()? {
                    map.insert(function, entry);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(WidgetMapVisitor)
    }
}

/// The whole persisted document. Unknown top-level keys are kept so a
/// merge never drops data written by other tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetSettings {
    /// Widget entries keyed by function name.
    #[serde(default)]
    pub widgets: WidgetMap,
    /// Any other keys stored alongside `widgets`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accepts integers, integral floats and numeric strings; anything else
/// (including corrupt values) reads as unset.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
