//! Selection and lock registry
//!
//! A [`SelectionSet`] tracks component ids grouped by type, independently of
//! the component tree. The session keeps two unrelated instances: one for
//! selection, one for locks. Ids that no longer resolve to an attached
//! component are dropped when the set is resolved, never reported as errors.

use crate::store::{Component, ComponentStore};
use guide_common::{ComponentId, ComponentType};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    entries: Vec<(ComponentType, ComponentId)>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, replacing the current contents unless `append` is set.
    /// Returns whether the set changed.
    pub fn insert(&mut self, kind: &ComponentType, id: &ComponentId, append: bool) -> bool {
        if append && self.contains(id) {
            return false;
        }
        if !append {
            if self.entries.len() == 1 && &self.entries[0].1 == id {
                return false;
            }
            self.entries.clear();
        }
        self.entries.push((kind.clone(), id.clone()));
        true
    }

    pub fn remove(&mut self, id: &ComponentId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(_, existing)| existing != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.entries.iter().any(|(_, existing)| existing == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.entries.iter().map(|(_, id)| id)
    }

    /// First entry; drives keyboard navigation
    pub fn primary(&self) -> Option<&ComponentId> {
        self.entries.first().map(|(_, id)| id)
    }

    /// Ids grouped by component type
    pub fn by_type(&self) -> BTreeMap<ComponentType, Vec<ComponentId>> {
        let mut map: BTreeMap<ComponentType, Vec<ComponentId>> = BTreeMap::new();
        for (kind, id) in &self.entries {
            map.entry(kind.clone()).or_default().push(id.clone());
        }
        map
    }

    /// Entries resolved against the store, skipping stale ones
    pub fn resolve<'s>(&self, store: &'s ComponentStore) -> Vec<&'s Component> {
        self.entries
            .iter()
            .filter(|(_, id)| store.is_attached(id))
            .filter_map(|(kind, id)| store.get_component(kind, id))
            .collect()
    }

    /// Drop entries that no longer resolve
    pub fn prune(&mut self, store: &ComponentStore) {
        self.entries
            .retain(|(kind, id)| store.is_attached(id) && store.get_component(kind, id).is_some());
    }

    /// Whether any descendant of `id` is in the set
    pub fn has_selected_descendants(&self, store: &ComponentStore, id: &ComponentId) -> bool {
        store
            .subtree(id)
            .iter()
            .skip(1)
            .any(|descendant| self.contains(descendant))
    }

    /// Replace the set with the previous/next sibling of the primary entry,
    /// wrapping around. Returns the newly selected id.
    pub fn move_selection(&mut self, store: &ComponentStore, reverse: bool) -> Option<ComponentId> {
        let current = self.primary()?.clone();
        let parent = store.get_component_parent(&current)?;
        let siblings = parent.children();
        let index = siblings.iter().position(|c| c == &current)?;

        let len = siblings.len();
        let next = if reverse {
            (index + len - 1) % len
        } else {
            (index + 1) % len
        };
        let next_id = siblings[next].clone();
        let kind = store.component(&next_id)?.kind().clone();

        self.insert(&kind, &next_id, false);
        Some(next_id)
    }
}
