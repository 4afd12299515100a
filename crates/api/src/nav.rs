//! Member navigation resolution.
//!
//! Admins store navigation preferences as a list of `{id, label, order, visible}`
//! entries (usually as JSON text in `site_settings`). [`resolve`] merges that with
//! the fixed allow-list into the ordered menu the member shell renders.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Navigation keys members can ever see, in default order.
pub const NAV_KEYS: [&str; 5] = ["dashboard", "community", "content", "tools", "experts"];

/// Default labels, parallel to [`NAV_KEYS`].
pub const DEFAULT_LABELS: [&str; 5] = ["Dashboard", "Community", "Library", "Tools", "Experts"];

/// Key of the entry appended for creators.
pub const ADMIN_KEY: &str = "admin";
pub const ADMIN_LABEL: &str = "Admin";

/// A render-ready navigation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavItem {
    pub key: String,
    pub label: String,
}

impl NavItem {
    fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Resolved menu plus the label for every known key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNav {
    pub items: Vec<NavItem>,
    pub labels: BTreeMap<String, String>,
}

/// One stored entry. Every field is optional because the config is admin-edited JSON.
#[derive(Debug, Clone, Default)]
struct StoredEntry {
    id: Option<String>,
    label: Option<String>,
    order: Option<f64>,
    visible: bool,
}

impl StoredEntry {
    fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: obj.get("id").and_then(|v| v.as_str()).map(str::to_string),
            label: obj.get("label").and_then(|v| v.as_str()).map(str::to_string),
            order: obj.get("order").and_then(serde_json::Value::as_f64),
            // Only a literal `true` counts; "true", 1, and null all hide the entry.
            visible: obj.get("visible") == Some(&serde_json::Value::Bool(true)),
        })
    }
}

/// Parse the stored config.
///
/// Accepts a JSON array or a string containing one. Anything else, including
/// malformed JSON, yields an empty list.
fn parse_entries(raw: &serde_json::Value) -> Vec<StoredEntry> {
    let parsed;
    let list = match raw {
        serde_json::Value::String(text) => {
            parsed = serde_json::from_str::<serde_json::Value>(text).unwrap_or_default();
            &parsed
        }
        other => other,
    };
    list.as_array()
        .map(|items| items.iter().filter_map(StoredEntry::from_value).collect())
        .unwrap_or_default()
}

fn default_label(key: &str) -> Option<&'static str> {
    NAV_KEYS
        .iter()
        .position(|k| *k == key)
        .map(|idx| DEFAULT_LABELS[idx])
}

/// Label fallback chain: stored label (non-blank) → default label → key.
fn pick_label(stored: Option<&str>, key: &str) -> String {
    stored
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| default_label(key).map(str::to_string))
        .unwrap_or_else(|| key.to_string())
}

/// The menu shown when nothing usable is stored.
pub fn default_items() -> Vec<NavItem> {
    NAV_KEYS
        .iter()
        .zip(DEFAULT_LABELS)
        .map(|(key, label)| NavItem::new(key, label))
        .collect()
}

/// Resolve a stored config into the member menu.
///
/// `raw` is the stored config (`Value::Null` when unset). `is_admin` appends the
/// admin entry after everything else.
pub fn resolve(raw: &serde_json::Value, is_admin: bool) -> ResolvedNav {
    let mut entries: Vec<StoredEntry> = parse_entries(raw)
        .into_iter()
        .filter(|e| e.id.as_deref().is_some_and(|id| NAV_KEYS.contains(&id)))
        .collect();
    // Stable sort: entries without a numeric order go last, ties keep stored order.
    entries.sort_by(|a, b| match (a.order, b.order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut seen = HashSet::new();
    let mut items: Vec<NavItem> = entries
        .iter()
        .filter(|e| e.visible)
        .filter_map(|entry| {
            let key = entry.id.as_deref()?;
            seen.insert(key)
                .then(|| NavItem::new(key, &pick_label(entry.label.as_deref(), key)))
        })
        .collect();

    // Shown keys take their menu label; hidden entries may only rename keys
    // the menu does not show, first in sorted order.
    let mut labels: BTreeMap<String, String> = NAV_KEYS
        .iter()
        .map(|key| (key.to_string(), pick_label(None, key)))
        .collect();
    for item in &items {
        labels.insert(item.key.clone(), item.label.clone());
    }
    for entry in entries.iter().filter(|e| !e.visible) {
        let Some(id) = entry.id.as_deref() else {
            continue;
        };
        let has_label = entry.label.as_deref().is_some_and(|l| !l.trim().is_empty());
        if has_label && seen.insert(id) {
            labels.insert(id.to_string(), pick_label(entry.label.as_deref(), id));
        }
    }

    if items.is_empty() {
        items = NAV_KEYS
            .iter()
            .map(|key| NavItem::new(key, &labels[*key]))
            .collect();
    }

    if is_admin {
        items.push(NavItem::new(ADMIN_KEY, ADMIN_LABEL));
        labels.insert(ADMIN_KEY.to_string(), ADMIN_LABEL.to_string());
    }

    ResolvedNav { items, labels }
}

/// Convenience for configs stored as text (`site_settings.value`).
pub fn resolve_stored(raw: Option<&str>, is_admin: bool) -> ResolvedNav {
    let value = raw
        .map(|s| serde_json::Value::String(s.to_string()))
        .unwrap_or(serde_json::Value::Null);
    resolve(&value, is_admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(nav: &ResolvedNav) -> Vec<&str> {
        nav.items.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn sorts_by_order_and_puts_missing_order_last() {
        let raw = json!([
            {"id": "tools", "visible": true},
            {"id": "community", "order": 100000, "visible": true},
            {"id": "dashboard", "order": 2, "visible": true},
            {"id": "content", "order": -1, "visible": true},
        ]);
        let nav = resolve(&raw, false);
        assert_eq!(keys(&nav), vec!["content", "dashboard", "community", "tools"]);
    }

    #[test]
    fn hidden_and_unknown_entries_never_appear() {
        let raw = json!([
            {"id": "dashboard", "order": 1, "visible": true},
            {"id": "community", "order": 2, "visible": false},
            {"id": "content", "order": 3, "visible": "true"},
            {"id": "tools", "order": 4},
            {"id": "billing", "order": 5, "visible": true},
            {"id": "admin", "order": 6, "visible": true},
        ]);
        let nav = resolve(&raw, false);
        assert_eq!(keys(&nav), vec!["dashboard"]);
    }

    #[test]
    fn label_fallback_chain() {
        let raw = json!([
            {"id": "dashboard", "order": 1, "visible": true, "label": "Home"},
            {"id": "content", "order": 2, "visible": true, "label": "   "},
            {"id": "experts", "order": 3, "visible": true},
        ]);
        let nav = resolve(&raw, false);
        let labels: Vec<&str> = nav.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "Library", "Experts"]);
        assert_eq!(nav.labels["dashboard"], "Home");
        assert_eq!(nav.labels["community"], "Community");
    }

    #[test]
    fn hidden_entries_still_rename_labels() {
        let raw = json!([
            {"id": "dashboard", "order": 1, "visible": true},
            {"id": "tools", "visible": false, "label": "Toolbox"},
        ]);
        let nav = resolve(&raw, false);
        assert_eq!(nav.labels["tools"], "Toolbox");
        assert_eq!(keys(&nav), vec!["dashboard"]);
    }

    #[test]
    fn duplicates_keep_first_in_sorted_order() {
        let raw = json!([
            {"id": "tools", "order": 5, "visible": true, "label": "Later"},
            {"id": "tools", "order": 1, "visible": true, "label": "Sooner"},
        ]);
        let nav = resolve(&raw, false);
        assert_eq!(nav.items, vec![NavItem::new("tools", "Sooner")]);
    }

    fn assert_labels_match_menu(nav: &ResolvedNav) {
        for item in &nav.items {
            assert_eq!(nav.labels[&item.key], item.label, "label map disagrees for {}", item.key);
        }
    }

    #[test]
    fn duplicate_labels_agree_with_menu_in_either_stored_order() {
        for raw in [
            json!([
                {"id": "tools", "order": 1, "visible": true, "label": "Sooner"},
                {"id": "tools", "order": 5, "visible": true, "label": "Later"},
            ]),
            json!([
                {"id": "tools", "order": 5, "visible": true, "label": "Later"},
                {"id": "tools", "order": 1, "visible": true, "label": "Sooner"},
            ]),
        ] {
            let nav = resolve(&raw, false);
            assert_eq!(nav.items, vec![NavItem::new("tools", "Sooner")], "config: {raw}");
            assert_eq!(nav.labels["tools"], "Sooner");
            assert_labels_match_menu(&nav);
        }
    }

    #[test]
    fn hidden_duplicate_never_renames_a_shown_key() {
        for raw in [
            json!([
                {"id": "tools", "order": 1, "visible": true, "label": "Visible"},
                {"id": "tools", "visible": false, "label": "Hidden"},
            ]),
            json!([
                {"id": "tools", "visible": false, "label": "Hidden"},
                {"id": "tools", "order": 1, "visible": true, "label": "Visible"},
            ]),
            json!([
                {"id": "tools", "order": 1, "visible": true},
                {"id": "tools", "order": 0, "visible": false, "label": "Hidden"},
            ]),
        ] {
            let nav = resolve(&raw, false);
            assert_labels_match_menu(&nav);
            assert_ne!(nav.labels["tools"], "Hidden", "config: {raw}");
        }
    }

    #[test]
    fn fallback_menu_uses_hidden_renames() {
        let raw = json!([{"id": "tools", "visible": false, "label": "Toolbox"}]);
        let nav = resolve(&raw, false);
        assert_eq!(nav.items.len(), NAV_KEYS.len());
        assert_eq!(nav.labels["tools"], "Toolbox");
        assert_labels_match_menu(&nav);
    }

    #[test]
    fn string_config_is_parsed() {
        let raw = json!(r#"[{"id":"experts","order":1,"visible":true}]"#);
        assert_eq!(keys(&resolve(&raw, false)), vec!["experts"]);
    }

    #[test]
    fn malformed_or_empty_config_falls_back_to_defaults() {
        for raw in [
            json!("[{not json"),
            json!(null),
            json!({"id": "tools"}),
            json!([]),
            json!([{"id": "tools", "visible": false}]),
        ] {
            let nav = resolve(&raw, false);
            assert_eq!(nav.items, default_items(), "config: {raw}");
        }
    }

    #[test]
    fn admin_entry_is_appended_last() {
        let nav = resolve_stored(None, true);
        assert_eq!(nav.items.len(), 6);
        assert_eq!(nav.items.last().unwrap().key, ADMIN_KEY);
        assert_eq!(nav.labels[ADMIN_KEY], ADMIN_LABEL);

        let member = resolve_stored(None, false);
        assert!(member.items.iter().all(|i| i.key != ADMIN_KEY));
        assert!(!member.labels.contains_key(ADMIN_KEY));
    }
}
