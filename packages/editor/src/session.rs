//! # Edit Session
//!
//! Application context for one open guide. A session owns exactly one
//! instance of each store (components, overrides, selection, locks,
//! clipboard, history) and is passed explicitly to everything that needs
//! them.

use crate::clipboard::Clipboard;
use crate::clock::{Clock, SystemClock};
use crate::history::{GroupOptions, History, HistoryHost};
use crate::overrides::{Overrides, FROZEN_REASON};
use crate::selection::SelectionSet;
use crate::store::{Component, ComponentStore, DirtySet};
use crate::{EditorConfig, EditorResult};
use chrono::{DateTime, Utc};
use guide_common::{ComponentDescriptor, ComponentId, Data, ModelRegistry};
use std::rc::Rc;

/// In-flight drag/resize gesture
#[derive(Debug, Clone)]
pub(crate) struct Gesture {
    pub(crate) id: ComponentId,
    pub(crate) start: Data,
}

/// Single editing session
#[derive(Debug)]
pub struct EditSession {
    pub(crate) store: ComponentStore,
    pub(crate) overrides: Overrides,
    pub(crate) selection: SelectionSet,
    pub(crate) locks: SelectionSet,
    pub(crate) clipboard: Clipboard,
    pub(crate) history: History<EditSession>,
    pub(crate) config: EditorConfig,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) media_time: f64,
    pub(crate) gesture: Option<Gesture>,
}

impl HistoryHost for EditSession {
    fn history(&self) -> &History<Self> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<Self> {
        &mut self.history
    }
}

impl EditSession {
    /// Create a session with the built-in models and the wall clock
    pub fn new(config: EditorConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    pub fn with_clock(config: EditorConfig, clock: Rc<dyn Clock>) -> Self {
        Self::with_models(ModelRegistry::builtin(), config, clock)
    }

    pub fn with_models(models: ModelRegistry, config: EditorConfig, clock: Rc<dyn Clock>) -> Self {
        let history = History::new(
            Rc::clone(&clock),
            config.coalesce_window_ms,
            config.history_max_levels,
        );

        Self {
            store: ComponentStore::new(models, Rc::clone(&clock)),
            overrides: Overrides::new(),
            selection: SelectionSet::new(),
            locks: SelectionSet::new(),
            clipboard: Clipboard::new(),
            history,
            config,
            clock,
            media_time: 0.0,
            gesture: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Direct store access; mutations made here are not recorded
    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut Overrides {
        &mut self.overrides
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    pub fn history(&self) -> &History<Self> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History<Self> {
        &mut self.history
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current media playback time, in seconds
    pub fn media_time(&self) -> f64 {
        self.media_time
    }

    pub fn set_media_time(&mut self, time: f64) {
        self.media_time = time;
    }

    /// Override-resolved data of a component
    pub fn effective_data(&self, id: &ComponentId) -> Option<Data> {
        self.store
            .component(id)
            .map(|component| self.overrides.resolve(id, component.data()))
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        History::undo(self)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        History::redo(self)
    }

    /// Run `f` inside a history group, discarding the group if it fails
    pub fn grouped<T>(
        &mut self,
        options: GroupOptions,
        f: impl FnOnce(&mut Self) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.history.start_group(options);
        let result = f(self);
        self.history.end_group(result.is_err());
        result
    }

    /// Components changed or removed at or after `since`
    pub fn dirty_since(&self, since: DateTime<Utc>) -> DirtySet {
        self.store.dirty_since(since)
    }

    /// Canonical descriptor tree of the document
    pub fn serialize(&self) -> EditorResult<Option<ComponentDescriptor>> {
        self.store.serialize()
    }

    // Selection

    pub fn select_component(&mut self, id: &ComponentId, append: bool) -> EditorResult<()> {
        let kind = self.store.require(id)?.kind().clone();
        self.selection.insert(&kind, id, append);
        Ok(())
    }

    pub fn deselect_component(&mut self, id: &ComponentId) {
        self.selection.remove(id);
    }

    pub fn deselect_all_components(&mut self) {
        self.selection.clear();
    }

    pub fn is_component_selected(&self, id: &ComponentId) -> bool {
        self.selection.contains(id)
    }

    pub fn get_selected_components(&self) -> Vec<&Component> {
        self.selection.resolve(&self.store)
    }

    pub fn selected_ids(&self) -> Vec<ComponentId> {
        self.get_selected_components()
            .into_iter()
            .map(|c| c.id().clone())
            .collect()
    }

    pub fn component_has_selected_descendents(&self, id: &ComponentId) -> bool {
        self.selection.has_selected_descendants(&self.store, id)
    }

    /// Select the previous/next sibling of the primary selection
    pub fn move_component_selection(&mut self, reverse: bool) -> Option<ComponentId> {
        self.selection.prune(&self.store);
        self.selection.move_selection(&self.store, reverse)
    }

    // Locks

    pub fn lock_component(&mut self, id: &ComponentId) -> EditorResult<()> {
        let kind = self.store.require(id)?.kind().clone();
        self.locks.insert(&kind, id, true);
        self.sync_disabled_fields(id);
        Ok(())
    }

    pub fn unlock_component(&mut self, id: &ComponentId) {
        self.locks.remove(id);
        self.sync_disabled_fields(id);
    }

    pub fn is_component_locked(&self, id: &ComponentId) -> bool {
        self.locks.contains(id)
    }

    pub fn get_locked_components(&self) -> Vec<&Component> {
        self.locks.resolve(&self.store)
    }

    /// Whether direct manipulation (drag/resize) may move the component
    pub fn is_draggable(&self, id: &ComponentId) -> bool {
        match self.store.component(id) {
            Some(component) => !component.is_locked() && !self.locks.contains(id),
            None => false,
        }
    }

    /// Disable the lockable fields of a locked component, enable them otherwise
    pub(crate) fn sync_disabled_fields(&mut self, id: &ComponentId) {
        let Some(component) = self.store.component(id) else {
            return;
        };
        let locked = component.is_locked() || self.locks.contains(id);
        let fields: Vec<String> = match self.store.models().get(component.kind()) {
            Ok(schema) if locked => schema.lockable_fields().map(str::to_string).collect(),
            _ => Vec::new(),
        };

        self.store.enable_fields(id);
        if !fields.is_empty() {
            self.store.disable_fields(id, fields.iter().map(String::as_str));
        }
    }

    // Freeze

    /// Pin the effective data of a component to its current value
    pub fn freeze_component(&mut self, id: &ComponentId) -> EditorResult<()> {
        let component = self.store.require(id)?;
        let snapshot = self.overrides.resolve(id, component.data());
        let priority = self.config.frozen_priority;
        self.overrides.set_overrides(id, FROZEN_REASON, snapshot, priority);
        tracing::debug!(%id, "component frozen");
        Ok(())
    }

    pub fn unfreeze_component(&mut self, id: &ComponentId) {
        self.overrides.clear_overrides(id, Some(FROZEN_REASON));
    }

    pub fn is_component_frozen(&self, id: &ComponentId) -> bool {
        self.overrides.has_overrides(id, FROZEN_REASON)
    }

    /// Clear selection, lock and override entries for `id` and its descendants
    pub(crate) fn forget_subtree(&mut self, id: &ComponentId) {
        for member in self.store.subtree(id) {
            self.selection.remove(&member);
            self.locks.remove(&member);
            self.overrides.clear_overrides(&member, None);
            self.sync_disabled_fields(&member);
        }
    }
}
