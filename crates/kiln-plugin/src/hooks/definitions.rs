//! Hook dispatch types.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resolved handler for one hook: the most-derived enabled class of its
/// override chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTarget {
    /// Handler class name.
    pub class: String,
    /// Plugin folder declaring the class.
    pub folder: String,
    /// Parent class, empty for none.
    pub extends: String,
}

/// Results of one dispatch, keyed `"{class}_{hook}"` in dispatch order.
///
/// Serializes as a map whose entries keep dispatch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookResults {
    entries: Vec<(String, Value)>,
}

impl HookResults {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result. Returns `false` and keeps the earlier value if the key
    /// is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Looks up a result.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Keys in dispatch order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing contributed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates results in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for HookResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Key under which a handler's result is stored.
pub fn result_key(class: &str, hook: &str) -> String {
    format!("{class}_{hook}")
}

/// Whether a handler result counts as a contribution.
///
/// `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty arrays or objects
/// are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
