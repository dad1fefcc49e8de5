//! # Component Store
//!
//! Sole authority for component existence, structure and canonical property
//! values.
//!
//! ## Structure
//!
//! Components live in a flat map keyed by id. Structure is held by each
//! component's ordered `children` list plus a `parent` back-reference; the
//! child list is the ownership edge.
//!
//! ## Removal
//!
//! [`ComponentStore::remove_component`] only detaches a component from its
//! parent. The detached subtree stays addressable so that undoing a removal
//! only has to re-add its top node. Recursive cleanup of selection, locks and
//! overrides is composed at the session layer.
//!
//! ## History
//!
//! The store never records history. [`ComponentStore::update_component`]
//! returns the old/new value pairs so callers can push an item themselves.

use crate::clock::Clock;
use crate::{EditorError, EditorResult};
use chrono::{DateTime, Utc};
use guide_common::{props, ComponentDescriptor, ComponentId, ComponentType, Data, ModelRegistry, Schema};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// A typed, uniquely identified node of the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    id: ComponentId,
    kind: ComponentType,
    data: Data,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
}

impl Component {
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn kind(&self) -> &ComponentType {
        &self.kind
    }

    /// Canonical data (not override-resolved)
    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn parent(&self) -> Option<&ComponentId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn is_locked(&self) -> bool {
        self.data
            .get(props::LOCKED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Old and new values of the keys an update actually changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDiff {
    pub old_values: Data,
    pub new_values: Data,
}

impl UpdateDiff {
    pub fn is_empty(&self) -> bool {
        self.new_values.is_empty()
    }
}

/// Structural and data change notifications
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Added {
        id: ComponentId,
        parent: ComponentId,
        index: usize,
    },
    Removed {
        id: ComponentId,
        parent: ComponentId,
        index: usize,
    },
    Updated {
        id: ComponentId,
        diff: UpdateDiff,
    },
}

/// Subscriber to [`StoreEvent`]s
pub trait StoreObserver {
    fn on_store_event(&mut self, event: &StoreEvent);
}

/// Observer that queues events for later draining
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<StoreEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued events
    pub fn drain(&self) -> Vec<StoreEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl StoreObserver for EventLog {
    fn on_store_event(&mut self, event: &StoreEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Components changed or removed since a timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtySet {
    pub changed: Vec<ComponentId>,
    pub removed: Vec<ComponentId>,
}

impl DirtySet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

pub struct ComponentStore {
    models: ModelRegistry,
    components: HashMap<ComponentId, Component>,
    root: Option<ComponentId>,
    disabled_fields: HashMap<ComponentId, BTreeSet<String>>,
    modified_at: HashMap<ComponentId, DateTime<Utc>>,
    removed_at: HashMap<ComponentId, DateTime<Utc>>,
    observers: Vec<Box<dyn StoreObserver>>,
    clock: Rc<dyn Clock>,
}

impl fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStore")
            .field("root", &self.root)
            .field("components", &self.components.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ComponentStore {
    pub fn new(models: ModelRegistry, clock: Rc<dyn Clock>) -> Self {
        Self {
            models,
            components: HashMap::new(),
            root: None,
            disabled_fields: HashMap::new(),
            modified_at: HashMap::new(),
            removed_at: HashMap::new(),
            observers: Vec::new(),
            clock,
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Static schema of a component type
    pub fn get_model_by_type(&self, kind: &ComponentType) -> EditorResult<&Schema> {
        Ok(self.models.get(kind)?)
    }

    /// Subscribe to store events
    pub fn add_observer(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    fn notify(&mut self, event: StoreEvent) {
        for observer in &mut self.observers {
            observer.on_store_event(&event);
        }
    }

    fn touch(&mut self, id: &ComponentId) {
        let now = self.clock.now();
        self.removed_at.remove(id);
        self.modified_at.insert(id.clone(), now);
    }

    /// Create a detached component.
    ///
    /// A fresh id is assigned unless `id` is given (used to recreate a
    /// component under its previous identity). Unset properties are filled
    /// with schema defaults.
    pub fn create_component(
        &mut self,
        kind: ComponentType,
        data: Data,
        id: Option<ComponentId>,
    ) -> EditorResult<ComponentId> {
        let mut data = self.models.validate(&kind, &data)?;
        data.remove(props::ID);
        data.remove(props::TYPE);

        let id = id.unwrap_or_else(ComponentId::generate);
        if self.components.contains_key(&id) {
            return Err(EditorError::DuplicateId(id));
        }

        tracing::debug!(%id, %kind, "component created");
        self.components.insert(
            id.clone(),
            Component {
                id: id.clone(),
                kind,
                data,
                parent: None,
                children: Vec::new(),
            },
        );
        self.touch(&id);

        Ok(id)
    }

    /// Check a whole descriptor tree without mutating anything.
    ///
    /// Ids carried by the descriptor must be unused in the store and unique
    /// within the tree.
    pub fn validate_descriptor(&self, descriptor: &ComponentDescriptor) -> EditorResult<()> {
        self.validate_tree(descriptor, &mut HashSet::new())
    }

    fn validate_tree<'a>(
        &self,
        descriptor: &'a ComponentDescriptor,
        seen: &mut HashSet<&'a ComponentId>,
    ) -> EditorResult<()> {
        self.models.validate(&descriptor.kind, &descriptor.data)?;
        if let Some(id) = &descriptor.id {
            if self.components.contains_key(id) || !seen.insert(id) {
                return Err(EditorError::DuplicateId(id.clone()));
            }
        }
        for child in &descriptor.children {
            self.models.check_child(&descriptor.kind, &child.kind)?;
            self.validate_tree(child, seen)?;
        }
        Ok(())
    }

    /// Create a detached subtree from a descriptor.
    ///
    /// Descriptor ids are kept when `keep_ids` is set, otherwise every node
    /// gets a fresh id. The whole tree is validated before anything is created.
    pub fn create_from_descriptor(
        &mut self,
        descriptor: &ComponentDescriptor,
        keep_ids: bool,
    ) -> EditorResult<ComponentId> {
        self.validate_descriptor(descriptor)?;
        self.create_tree(descriptor, keep_ids)
    }

    fn create_tree(&mut self, descriptor: &ComponentDescriptor, keep_ids: bool) -> EditorResult<ComponentId> {
        let id = if keep_ids { descriptor.id.clone() } else { None };
        let id = self.create_component(descriptor.kind.clone(), descriptor.data.clone(), id)?;

        for child in &descriptor.children {
            let child_id = self.create_tree(child, keep_ids)?;
            self.add_component(&child_id, &id, None)?;
        }

        Ok(id)
    }

    /// Make `id` the document root
    pub fn set_root(&mut self, id: &ComponentId) -> EditorResult<()> {
        let component = self.require(id)?;
        if component.parent.is_some() {
            return Err(EditorError::NotAttached(id.clone()));
        }
        self.root = Some(id.clone());
        Ok(())
    }

    pub fn root(&self) -> Option<&ComponentId> {
        self.root.as_ref()
    }

    /// Insert `id` into `parent`'s children at `index` (default: append).
    ///
    /// A component that already has a parent is detached from it first.
    pub fn add_component(
        &mut self,
        id: &ComponentId,
        parent: &ComponentId,
        index: Option<usize>,
    ) -> EditorResult<()> {
        let kind = self.require(id)?.kind.clone();
        let parent_kind = self.require(parent)?.kind.clone();
        self.models.check_child(&parent_kind, &kind)?;

        if id == parent || self.is_descendant_of(parent, id) {
            return Err(EditorError::Cycle(id.clone()));
        }

        if self.component(id).and_then(|c| c.parent.as_ref()).is_some() {
            self.remove_component(id)?;
        }

        let parent_component = self.require_mut(parent)?;
        let index = index
            .unwrap_or(parent_component.children.len())
            .min(parent_component.children.len());
        parent_component.children.insert(index, id.clone());

        if let Some(component) = self.components.get_mut(id) {
            component.parent = Some(parent.clone());
        }
        self.touch(id);

        tracing::debug!(%id, %parent, index, "component added");
        self.notify(StoreEvent::Added {
            id: id.clone(),
            parent: parent.clone(),
            index,
        });

        Ok(())
    }

    /// Detach `id` from its parent. Returns the former parent and index.
    ///
    /// Descendants stay linked under `id` and remain addressable.
    pub fn remove_component(&mut self, id: &ComponentId) -> EditorResult<Option<(ComponentId, usize)>> {
        let Some(parent) = self.require(id)?.parent.clone() else {
            return Ok(None);
        };

        let parent_component = self.require_mut(&parent)?;
        let Some(index) = parent_component.children.iter().position(|c| c == id) else {
            return Ok(None);
        };
        parent_component.children.remove(index);

        if let Some(component) = self.components.get_mut(id) {
            component.parent = None;
        }
        let now = self.clock.now();
        self.removed_at.insert(id.clone(), now);
        self.modified_at.remove(id);

        tracing::debug!(%id, %parent, index, "component removed");
        self.notify(StoreEvent::Removed {
            id: id.clone(),
            parent: parent.clone(),
            index,
        });

        Ok(Some((parent, index)))
    }

    /// Shallow-merge `partial` into the canonical data.
    ///
    /// Disabled fields, `id` and `type` are skipped; values equal to the
    /// current ones are not reported.
    pub fn update_component(&mut self, id: &ComponentId, partial: Data) -> EditorResult<UpdateDiff> {
        let disabled = self.disabled_fields.get(id).cloned().unwrap_or_default();
        self.merge_data(id, partial, &disabled)
    }

    /// Like [`ComponentStore::update_component`] but writes disabled fields
    /// too. Used to replay history, which must not depend on lock state.
    pub fn set_data(&mut self, id: &ComponentId, partial: Data) -> EditorResult<UpdateDiff> {
        self.merge_data(id, partial, &BTreeSet::new())
    }

    fn merge_data(&mut self, id: &ComponentId, partial: Data, disabled: &BTreeSet<String>) -> EditorResult<UpdateDiff> {
        let component = self.require_mut(id)?;

        let mut diff = UpdateDiff::default();
        for (key, value) in partial {
            if key == props::ID || key == props::TYPE || disabled.contains(&key) {
                continue;
            }
            let old = component.data.get(&key).cloned().unwrap_or(Value::Null);
            if old == value {
                continue;
            }
            component.data.insert(key.clone(), value.clone());
            diff.old_values.insert(key.clone(), old);
            diff.new_values.insert(key, value);
        }

        if !diff.is_empty() {
            self.touch(id);
            tracing::debug!(%id, keys = ?diff.new_values.keys().collect::<Vec<_>>(), "component updated");
            self.notify(StoreEvent::Updated {
                id: id.clone(),
                diff: diff.clone(),
            });
        }

        Ok(diff)
    }

    /// Look up a component by type and id
    pub fn get_component(&self, kind: &ComponentType, id: &ComponentId) -> Option<&Component> {
        self.components.get(id).filter(|c| &c.kind == kind)
    }

    /// Look up a component by id alone
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub(crate) fn require(&self, id: &ComponentId) -> EditorResult<&Component> {
        self.components
            .get(id)
            .ok_or_else(|| EditorError::ComponentNotFound(id.clone()))
    }

    fn require_mut(&mut self, id: &ComponentId) -> EditorResult<&mut Component> {
        self.components
            .get_mut(id)
            .ok_or_else(|| EditorError::ComponentNotFound(id.clone()))
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get_component_parent(&self, id: &ComponentId) -> Option<&Component> {
        self.components
            .get(id)
            .and_then(|c| c.parent.as_ref())
            .and_then(|p| self.components.get(p))
    }

    /// Ordered children
    pub fn get_component_children(&self, id: &ComponentId) -> Vec<&Component> {
        self.components
            .get(id)
            .map(|c| {
                c.children
                    .iter()
                    .filter_map(|child| self.components.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Position among siblings; `None` for the root or detached components
    pub fn get_component_index(&self, id: &ComponentId) -> Option<usize> {
        self.get_component_parent(id)
            .and_then(|parent| parent.children.iter().position(|c| c == id))
    }

    /// Sibling indices from the topmost ancestor down to `id`. Sorting by
    /// this path gives document order.
    pub fn index_path(&self, id: &ComponentId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id.clone();
        while let Some(index) = self.get_component_index(&current) {
            path.push(index);
            match self.components.get(&current).and_then(|c| c.parent.clone()) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Whether `id` is reachable from the document root
    pub fn is_attached(&self, id: &ComponentId) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        let mut current = Some(id);
        while let Some(cid) = current {
            if cid == root {
                return true;
            }
            current = self.components.get(cid).and_then(|c| c.parent.as_ref());
        }
        false
    }

    /// Whether `id` sits below `ancestor`
    pub fn is_descendant_of(&self, id: &ComponentId, ancestor: &ComponentId) -> bool {
        let mut current = self.components.get(id).and_then(|c| c.parent.as_ref());
        while let Some(cid) = current {
            if cid == ancestor {
                return true;
            }
            current = self.components.get(cid).and_then(|c| c.parent.as_ref());
        }
        false
    }

    /// `id` followed by all its descendants, depth-first
    pub fn subtree(&self, id: &ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(component) = self.components.get(&current) {
                stack.extend(component.children.iter().rev().cloned());
                out.push(current);
            }
        }
        out
    }

    /// Disable fields so that updates skip them
    pub fn disable_fields<'a>(&mut self, id: &ComponentId, fields: impl IntoIterator<Item = &'a str>) {
        self.disabled_fields
            .entry(id.clone())
            .or_default()
            .extend(fields.into_iter().map(str::to_string));
    }

    pub fn enable_fields(&mut self, id: &ComponentId) {
        self.disabled_fields.remove(id);
    }

    pub fn disabled_fields(&self, id: &ComponentId) -> BTreeSet<String> {
        self.disabled_fields.get(id).cloned().unwrap_or_default()
    }

    /// Components changed or removed at or after `since`
    pub fn dirty_since(&self, since: DateTime<Utc>) -> DirtySet {
        let mut changed: Vec<ComponentId> = self
            .modified_at
            .iter()
            .filter(|(_, at)| **at >= since)
            .map(|(id, _)| id.clone())
            .collect();
        let mut removed: Vec<ComponentId> = self
            .removed_at
            .iter()
            .filter(|(_, at)| **at >= since)
            .map(|(id, _)| id.clone())
            .collect();
        changed.sort();
        removed.sort();

        DirtySet { changed, removed }
    }

    /// Descriptor of the subtree under `id`
    pub fn to_descriptor(&self, id: &ComponentId, keep_ids: bool) -> EditorResult<ComponentDescriptor> {
        let component = self.require(id)?;
        let mut descriptor = ComponentDescriptor::new(component.kind.clone());
        descriptor.data = component.data.clone();
        if keep_ids {
            descriptor.id = Some(component.id.clone());
        }
        for child in &component.children {
            descriptor.children.push(self.to_descriptor(child, keep_ids)?);
        }
        Ok(descriptor)
    }

    /// Descriptor tree of the whole document
    pub fn serialize(&self) -> EditorResult<Option<ComponentDescriptor>> {
        self.root
            .as_ref()
            .map(|root| self.to_descriptor(root, true))
            .transpose()
    }

    /// Drop every component (observers are kept)
    pub fn clear(&mut self) {
        self.components.clear();
        self.root = None;
        self.disabled_fields.clear();
        self.modified_at.clear();
        self.removed_at.clear();
    }
}
