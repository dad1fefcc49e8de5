//! # Override Layer
//!
//! Non-destructive, priority-ranked shadows over canonical component data.
//!
//! Every reader that shows data to the user (preview renderer, property
//! panel) resolves through [`Overrides::get`], so shadows are transparent.
//! Overrides only affect property values, never structure, and are never
//! created implicitly by regular edits.

use crate::store::ComponentStore;
use guide_common::{ComponentId, ComponentType, Data};
use std::collections::{BTreeMap, HashMap};

/// Reason key used when freezing a component for preview playback
pub const FROZEN_REASON: &str = "app_preview:frozen";

#[derive(Debug, Clone, PartialEq)]
struct OverrideEntry {
    data: Data,
    priority: i32,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Overrides {
    entries: HashMap<ComponentId, BTreeMap<String, OverrideEntry>>,
    next_seq: u64,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace the entry for `(id, reason)`
    pub fn set_overrides(&mut self, id: &ComponentId, reason: &str, data: Data, priority: i32) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.entries
            .entry(id.clone())
            .or_default()
            .insert(reason.to_string(), OverrideEntry { data, priority, seq });
    }

    /// Remove one entry, or every entry of the component when `reason` is `None`
    pub fn clear_overrides(&mut self, id: &ComponentId, reason: Option<&str>) {
        match reason {
            Some(reason) => {
                if let Some(entries) = self.entries.get_mut(id) {
                    entries.remove(reason);
                    if entries.is_empty() {
                        self.entries.remove(id);
                    }
                }
            }
            None => {
                self.entries.remove(id);
            }
        }
    }

    pub fn has_overrides(&self, id: &ComponentId, reason: &str) -> bool {
        self.entries
            .get(id)
            .map(|entries| entries.contains_key(reason))
            .unwrap_or(false)
    }

    /// Canonical data merged with the override entries of `id`
    pub fn resolve(&self, id: &ComponentId, canonical: &Data) -> Data {
        let mut effective = canonical.clone();

        if let Some(entries) = self.entries.get(id) {
            let mut ordered: Vec<&OverrideEntry> = entries.values().collect();
            ordered.sort_by_key(|e| (e.priority, e.seq));
            for entry in ordered {
                for (key, value) in &entry.data {
                    effective.insert(key.clone(), value.clone());
                }
            }
        }

        effective
    }

    /// Effective data of a component
    pub fn get(&self, store: &ComponentStore, kind: &ComponentType, id: &ComponentId) -> Option<Data> {
        store
            .get_component(kind, id)
            .map(|component| self.resolve(id, component.data()))
    }

    /// Number of components with at least one override
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use guide_common::ModelRegistry;
    use serde_json::json;
    use std::rc::Rc;

    fn data(value: serde_json::Value) -> Data {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_higher_priority_wins() {
        let mut overrides = Overrides::new();
        let id = ComponentId::new("t1");
        overrides.set_overrides(&id, "high", data(json!({ "x": 3 })), 10);
        overrides.set_overrides(&id, "low", data(json!({ "x": 2, "y": 2 })), 1);

        let effective = overrides.resolve(&id, &data(json!({ "x": 1, "y": 1, "z": 1 })));
        assert_eq!(effective, data(json!({ "x": 3, "y": 2, "z": 1 })));
    }

    #[test]
    fn test_later_entry_wins_priority_ties() {
        let mut overrides = Overrides::new();
        let id = ComponentId::new("t1");
        overrides.set_overrides(&id, "b", data(json!({ "x": "b" })), 0);
        overrides.set_overrides(&id, "a", data(json!({ "x": "a" })), 0);

        let effective = overrides.resolve(&id, &Data::new());
        assert_eq!(effective.get("x"), Some(&json!("a")));
    }

    #[test]
    fn test_clear_specific_and_all() {
        let mut overrides = Overrides::new();
        let id = ComponentId::new("t1");
        overrides.set_overrides(&id, "a", data(json!({ "x": 1 })), 0);
        overrides.set_overrides(&id, "b", data(json!({ "y": 1 })), 0);

        overrides.clear_overrides(&id, Some("a"));
        assert!(!overrides.has_overrides(&id, "a"));
        assert!(overrides.has_overrides(&id, "b"));

        overrides.clear_overrides(&id, None);
        assert!(!overrides.has_overrides(&id, "b"));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_get_never_mutates_canonical_data() {
        let mut store = ComponentStore::new(ModelRegistry::builtin(), Rc::new(SystemClock));
        let id = store
            .create_component(ComponentType::TEXT, data(json!({ "text": "real" })), None)
            .unwrap();

        let mut overrides = Overrides::new();
        overrides.set_overrides(&id, FROZEN_REASON, data(json!({ "text": "shadow" })), 100);

        let effective = overrides.get(&store, &ComponentType::TEXT, &id).unwrap();
        assert_eq!(effective.get("text"), Some(&json!("shadow")));
        assert_eq!(store.component(&id).unwrap().get("text"), Some(&json!("real")));
        assert!(overrides.get(&store, &ComponentType::IMAGE, &id).is_none());
    }
}
