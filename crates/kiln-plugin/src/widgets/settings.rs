//! Merging stored widget rows into the persisted settings document.

use std::collections::HashMap;

use kiln_entity::widget::{WidgetMap, WidgetRecord, WidgetSettings};

/// What the merge needs to know about a widget's owning plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerState {
    /// Whether the plugin is currently enabled.
    pub active: bool,
    /// The plugin's handler class.
    pub class: Option<String>,
}

/// Merges widget rows into `settings`.
///
/// `order` (a running counter from 1 in row order), `block` and `enabled`
/// are filled only when unset, so administrator choices survive. A widget
/// whose plugin is inactive is always disabled. Identity fields are
/// overwritten from the row. Entries without a row are kept.
pub fn merge(
    settings: &mut WidgetSettings,
    records: &[WidgetRecord],
    owners: &HashMap<String, OwnerState>,
    default_block: i64,
) {
    for (position, record) in records.iter().enumerate() {
        let owner = owners.get(&record.plugin).cloned().unwrap_or_default();
        let entry = settings.widgets.entry(&record.function);

        entry.order.get_or_insert(position as i64 + 1);
        entry.block.get_or_insert(default_block);
        entry.enabled.get_or_insert(true);
        if !owner.active {
            entry.enabled = Some(false);
        }

        entry.plugin = Some(record.plugin.clone());
        entry.class = owner.class;
        entry.function = Some(record.function.clone());
        entry.args = Some(record.args.clone());
    }
}

/// A copy of `widgets` stably sorted by `order`.
pub fn ordered(widgets: &WidgetMap) -> WidgetMap {
    let mut sorted = widgets.clone();
    sorted.sort_by_order();
    sorted
}

/// The highest `block` in use, never less than 1. Missing or
/// non-positive blocks are ignored.
pub fn highest_block(widgets: &WidgetMap) -> i64 {
    widgets
        .iter()
        .filter_map(|(_, entry)| entry.block)
        .filter(|block| *block > 0)
        .fold(1, i64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kiln_entity::widget::WidgetEntry;

    fn record(plugin: &str, function: &str) -> WidgetRecord {
        WidgetRecord {
            id: 0,
            plugin: plugin.to_string(),
            function: function.to_string(),
            args: String::new(),
            updated_at: Utc::now(),
            updated_by: 0,
        }
    }

    fn owners(active: bool) -> HashMap<String, OwnerState> {
        HashMap::from([(
            "blog".to_string(),
            OwnerState {
                active,
                class: Some("Blog".to_string()),
            },
        )])
    }

    #[test]
    fn test_defaults_fill_unset_fields() {
        let mut settings = WidgetSettings::default();
        let records = [record("blog", "recent"), record("blog", "tags")];
        merge(&mut settings, &records, &owners(true), 1);

        let tags = settings.widgets.get("tags").unwrap();
        assert_eq!(tags.order, Some(2));
        assert_eq!(tags.block, Some(1));
        assert_eq!(tags.enabled, Some(true));
        assert_eq!(tags.class.as_deref(), Some("Blog"));
        assert_eq!(tags.args.as_deref(), Some(""));
    }

    #[test]
    fn test_customisations_are_sticky() {
        let mut settings = WidgetSettings::default();
        settings.widgets.insert(
            "recent",
            WidgetEntry {
                order: Some(5),
                block: Some(3),
                enabled: Some(false),
                ..Default::default()
            },
        );
        merge(&mut settings, &[record("blog", "recent")], &owners(true), 1);

        let recent = settings.widgets.get("recent").unwrap();
        assert_eq!(recent.order, Some(5));
        assert_eq!(recent.block, Some(3));
        assert_eq!(recent.enabled, Some(false));
        assert_eq!(recent.plugin.as_deref(), Some("blog"));
    }

    #[test]
    fn test_inactive_owner_forces_disabled() {
        let mut settings = WidgetSettings::default();
        settings.widgets.insert(
            "recent",
            WidgetEntry {
                enabled: Some(true),
                ..Default::default()
            },
        );
        merge(&mut settings, &[record("blog", "recent")], &owners(false), 1);
        assert_eq!(settings.widgets.get("recent").unwrap().enabled, Some(false));
    }

    #[test]
    fn test_entries_without_rows_are_kept() {
        let mut settings = WidgetSettings::default();
        settings.widgets.insert("legacy", WidgetEntry::default());
        merge(&mut settings, &[record("blog", "recent")], &owners(true), 1);
        assert_eq!(settings.widgets.keys().collect::<Vec<_>>(), vec!["legacy", "recent"]);
    }

    #[test]
    fn test_highest_block() {
        assert_eq!(highest_block(&WidgetMap::new()), 1);

        let map: WidgetMap = [
            ("a".to_string(), WidgetEntry { block: Some(3), ..Default::default() }),
            ("b".to_string(), WidgetEntry { block: Some(1), ..Default::default() }),
        ]
        .into_iter()
        .collect();
        assert_eq!(highest_block(&map), 3);

        let corrupt: WidgetMap = [
            ("a".to_string(), WidgetEntry { block: Some(-4), ..Default::default() }),
            ("b".to_string(), WidgetEntry::default()),
        ]
        .into_iter()
        .collect();
        assert_eq!(highest_block(&corrupt), 1);
    }

    #[test]
    fn test_ordered_is_stable() {
        let map: WidgetMap = [
            ("x".to_string(), WidgetEntry { order: Some(2), ..Default::default() }),
            ("y".to_string(), WidgetEntry { order: Some(1), ..Default::default() }),
            ("z".to_string(), WidgetEntry { order: Some(2), ..Default::default() }),
        ]
        .into_iter()
        .collect();
        assert_eq!(ordered(&map).keys().collect::<Vec<_>>(), vec!["y", "x", "z"]);
    }
}
