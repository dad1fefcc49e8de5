//! # Recorded Mutations
//!
//! User-facing edit operations. Each one validates, mutates the store, then
//! pushes a history item whose closures replay the change in either
//! direction.
//!
//! ## Semantics
//!
//! ### Update
//! - Shallow merge, disabled fields skipped
//! - Undo and redo also write keys that a lock disabled after the edit
//! - Page `start-time`/`end-time` edits in synchronized blocks also move the
//!   adjoining boundary of the neighbouring pages (one undo step)
//!
//! ### Add
//! - Creates the whole descriptor subtree with fresh ids, then inserts it
//! - The new component becomes the selection
//!
//! ### Delete
//! - Detaches each top-level component; descendants stay linked below it
//! - Selection, lock and override entries of the whole subtree are cleared
//! - Undo re-inserts at the original index
//!
//! ### Move
//! - Reparent with child-type validation; undo restores parent and index

use crate::history::{GroupOptions, HistoryItem};
use crate::session::EditSession;
use crate::store::UpdateDiff;
use crate::{EditorError, EditorResult};
use guide_common::{props, ComponentDescriptor, ComponentId, Data};

impl EditSession {
    /// Update a component and record the change.
    pub fn update_component(&mut self, id: &ComponentId, partial: Data) -> EditorResult<UpdateDiff> {
        let reconciles = self.is_synched_page(id)
            && (partial.contains_key(props::START_TIME) || partial.contains_key(props::END_TIME));

        if reconciles {
            self.grouped(GroupOptions::default(), |session| {
                let diff = session.update_recorded(id, partial, None)?;
                session.reconcile_page_times(id, &diff)?;
                Ok(diff)
            })
        } else {
            self.update_recorded(id, partial, None)
        }
    }

    /// Apply an update and push one item for the keys that changed
    pub(crate) fn update_recorded(
        &mut self,
        id: &ComponentId,
        partial: Data,
        coalesce_id: Option<String>,
    ) -> EditorResult<UpdateDiff> {
        let diff = self.apply_data(id, partial)?;
        self.record_diff(id, &diff, coalesce_id);
        Ok(diff)
    }

    /// Push an item reverting/reapplying `diff`
    pub(crate) fn record_diff(&mut self, id: &ComponentId, diff: &UpdateDiff, coalesce_id: Option<String>) {
        if diff.is_empty() {
            return;
        }

        let (undo_id, redo_id) = (id.clone(), id.clone());
        let old_values = diff.old_values.clone();
        let new_values = diff.new_values.clone();

        let mut item = HistoryItem::new(
            move |session: &mut EditSession| session.replay_data(&undo_id, old_values.clone()),
            move |session: &mut EditSession| session.replay_data(&redo_id, new_values.clone()),
        );
        if let Some(coalesce_id) = coalesce_id {
            item = item.with_coalesce_id(coalesce_id);
        }
        self.history.push(item);
    }

    /// Unrecorded update that keeps lock-derived field state in sync
    pub(crate) fn apply_data(&mut self, id: &ComponentId, partial: Data) -> EditorResult<UpdateDiff> {
        let diff = self.store.update_component(id, partial)?;
        if diff.new_values.contains_key(props::LOCKED) {
            self.sync_disabled_fields(id);
        }
        Ok(diff)
    }

    /// History replay path: writes every key, including lock-disabled ones
    fn replay_data(&mut self, id: &ComponentId, values: Data) -> EditorResult<()> {
        let diff = self.store.set_data(id, values)?;
        if diff.new_values.contains_key(props::LOCKED) {
            self.sync_disabled_fields(id);
        }
        Ok(())
    }

    /// Create a component subtree from a descriptor and insert it under
    /// `parent`. Returns the id of the new top component.
    pub fn add_component(
        &mut self,
        descriptor: &ComponentDescriptor,
        parent: &ComponentId,
        index: Option<usize>,
    ) -> EditorResult<ComponentId> {
        let parent_kind = self.store.require(parent)?.kind().clone();
        self.store.models().check_child(&parent_kind, &descriptor.kind)?;
        self.store.validate_descriptor(descriptor)?;

        let id = self.store.create_from_descriptor(descriptor, false)?;
        self.insert_recorded(&id, parent, index)?;
        self.select_component(&id, false)?;

        Ok(id)
    }

    /// Insert an existing component and push the matching item
    pub(crate) fn insert_recorded(
        &mut self,
        id: &ComponentId,
        parent: &ComponentId,
        index: Option<usize>,
    ) -> EditorResult<()> {
        self.store.add_component(id, parent, index)?;
        let index = self.store.get_component_index(id);

        let (undo_id, redo_id, redo_parent) = (id.clone(), id.clone(), parent.clone());
        self.history.push(HistoryItem::new(
            move |session: &mut EditSession| session.detach(&undo_id),
            move |session: &mut EditSession| {
                session.store.add_component(&redo_id, &redo_parent, index)?;
                session.sync_disabled_fields(&redo_id);
                Ok(())
            },
        ));

        Ok(())
    }

    /// Detach a component and clear every registry entry of its subtree
    pub(crate) fn detach(&mut self, id: &ComponentId) -> EditorResult<()> {
        self.forget_subtree(id);
        self.store.remove_component(id)?;
        Ok(())
    }

    /// Delete components (and, transitively, their descendants) as one
    /// undoable step. Components nested in another deleted component are
    /// covered by their ancestor.
    pub fn delete_components(&mut self, ids: &[ComponentId]) -> EditorResult<usize> {
        for id in ids {
            self.store.require(id)?;
        }
        let tops: Vec<ComponentId> = ids
            .iter()
            .filter(|id| !ids.iter().any(|other| self.store.is_descendant_of(id, other)))
            .filter(|id| self.store.component(id).and_then(|c| c.parent()).is_some())
            .cloned()
            .collect();

        self.grouped(GroupOptions::default(), |session| {
            for id in &tops {
                session.delete_recorded(id)?;
            }
            Ok(tops.len())
        })
    }

    fn delete_recorded(&mut self, id: &ComponentId) -> EditorResult<()> {
        let Some(parent) = self.store.component(id).and_then(|c| c.parent()).cloned() else {
            return Ok(());
        };
        let index = self.store.get_component_index(id);

        self.detach(id)?;
        tracing::debug!(%id, %parent, "component deleted");

        let (undo_id, redo_id) = (id.clone(), id.clone());
        self.history.push(HistoryItem::new(
            move |session: &mut EditSession| {
                session.store.add_component(&undo_id, &parent, index)?;
                session.sync_disabled_fields(&undo_id);
                Ok(())
            },
            move |session: &mut EditSession| session.detach(&redo_id),
        ));

        Ok(())
    }

    /// Move a component under `new_parent` at `index` (default: append)
    pub fn move_component(
        &mut self,
        id: &ComponentId,
        new_parent: &ComponentId,
        index: Option<usize>,
    ) -> EditorResult<()> {
        let old_parent = self
            .store
            .component(id)
            .and_then(|c| c.parent())
            .cloned()
            .ok_or_else(|| EditorError::NotAttached(id.clone()))?;
        let old_index = self.store.get_component_index(id);

        self.store.add_component(id, new_parent, index)?;
        let new_index = self.store.get_component_index(id);

        let (undo_id, redo_id, redo_parent) = (id.clone(), id.clone(), new_parent.clone());
        self.history.push(HistoryItem::new(
            move |session: &mut EditSession| session.store.add_component(&undo_id, &old_parent, old_index),
            move |session: &mut EditSession| session.store.add_component(&redo_id, &redo_parent, new_index),
        ));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::EditorConfig;
    use guide_common::{ComponentType, ModelError};
    use serde_json::json;
    use std::rc::Rc;

    fn data(value: serde_json::Value) -> Data {
        value.as_object().cloned().unwrap_or_default()
    }

    fn session() -> EditSession {
        let mut session = EditSession::with_clock(EditorConfig::default(), Rc::new(ManualClock::default()));
        let doc = ComponentDescriptor::new(ComponentType::SCENARIO).with_id("s1").with_child(
            ComponentDescriptor::new(ComponentType::BLOCK)
                .with_id("b1")
                .with_child(
                    ComponentDescriptor::new(ComponentType::PAGE)
                        .with_id("p1")
                        .with_child(ComponentDescriptor::new(ComponentType::TEXT).with_id("t1")),
                )
                .with_child(ComponentDescriptor::new(ComponentType::PAGE).with_id("p2")),
        );
        session.load(&doc).unwrap();
        session
    }

    fn x_of(session: &EditSession, id: &str) -> serde_json::Value {
        session.store().component(&id.into()).unwrap().get("x").cloned().unwrap()
    }

    #[test]
    fn test_update_is_undoable() {
        let mut session = session();
        let t1 = ComponentId::new("t1");

        session.update_component(&t1, data(json!({ "x": 10.0 }))).unwrap();
        session.update_component(&t1, data(json!({ "x": 20.0 }))).unwrap();
        assert_eq!(session.history().len(), 2);

        session.undo().unwrap();
        assert_eq!(x_of(&session, "t1"), json!(10.0));
        session.undo().unwrap();
        assert_eq!(x_of(&session, "t1"), json!(0.0));
        session.redo().unwrap();
        session.redo().unwrap();
        assert_eq!(x_of(&session, "t1"), json!(20.0));
    }

    #[test]
    fn test_undo_after_lock_restores_locked_field() {
        let mut session = session();
        let t1 = ComponentId::new("t1");

        session.update_component(&t1, data(json!({ "x": 50.0 }))).unwrap();
        session.lock_component(&t1).unwrap();

        assert!(session.undo().unwrap());
        assert_eq!(x_of(&session, "t1"), json!(0.0));
        assert!(session.redo().unwrap());
        assert_eq!(x_of(&session, "t1"), json!(50.0));

        // The lock still gates direct edits
        session.update_component(&t1, data(json!({ "x": 70.0 }))).unwrap();
        assert_eq!(x_of(&session, "t1"), json!(50.0));
    }

    #[test]
    fn test_noop_update_is_not_recorded() {
        let mut session = session();
        session
            .update_component(&"t1".into(), data(json!({ "x": 0.0 })))
            .unwrap();
        assert_eq!(session.history().len(), 0);
    }

    #[test]
    fn test_add_component_selects_and_undoes() {
        let mut session = session();
        let p1 = ComponentId::new("p1");

        let id = session
            .add_component(&ComponentDescriptor::new(ComponentType::IMAGE), &p1, None)
            .unwrap();
        assert_eq!(session.selected_ids(), vec![id.clone()]);
        assert_eq!(session.store().get_component_index(&id), Some(1));

        session.undo().unwrap();
        assert!(!session.store().is_attached(&id));
        assert!(session.get_selected_components().is_empty());

        session.redo().unwrap();
        assert_eq!(session.store().get_component_index(&id), Some(1));
    }

    #[test]
    fn test_add_incompatible_child_fails_without_mutation() {
        let mut session = session();
        let before = session.store().len();

        let err = session
            .add_component(&ComponentDescriptor::new(ComponentType::TEXT), &"b1".into(), None)
            .unwrap_err();

        assert!(matches!(err, EditorError::Model(ModelError::IncompatibleChild { .. })));
        assert_eq!(session.store().len(), before);
        assert_eq!(session.history().len(), 0);
    }

    #[test]
    fn test_delete_clears_registries_and_undo_restores() {
        let mut session = session();
        let p1 = ComponentId::new("p1");
        let t1 = ComponentId::new("t1");

        session.select_component(&t1, false).unwrap();
        session.lock_component(&t1).unwrap();
        session.freeze_component(&t1).unwrap();

        assert_eq!(session.delete_components(&[p1.clone(), t1.clone()]).unwrap(), 1);
        assert!(!session.store().is_attached(&p1));
        assert!(!session.is_component_selected(&t1));
        assert!(!session.is_component_locked(&t1));
        assert!(!session.is_component_frozen(&t1));
        assert_eq!(session.history().len(), 1);

        session.undo().unwrap();
        assert_eq!(session.store().get_component_index(&p1), Some(0));
        assert!(session.store().is_attached(&t1));

        session.redo().unwrap();
        assert!(!session.store().is_attached(&t1));
    }

    #[test]
    fn test_delete_multiple_siblings_restores_order() {
        let mut session = session();
        let p1 = ComponentId::new("p1");
        let p2 = ComponentId::new("p2");

        session.delete_components(&[p1.clone(), p2.clone()]).unwrap();
        assert!(session.store().get_component_children(&"b1".into()).is_empty());

        session.undo().unwrap();
        assert_eq!(session.store().get_component_index(&p1), Some(0));
        assert_eq!(session.store().get_component_index(&p2), Some(1));
    }

    #[test]
    fn test_move_component_round_trip() {
        let mut session = session();
        let t1 = ComponentId::new("t1");
        let p2 = ComponentId::new("p2");

        session.move_component(&t1, &p2, None).unwrap();
        assert_eq!(session.store().get_component_parent(&t1).unwrap().id(), &p2);

        session.undo().unwrap();
        assert_eq!(session.store().get_component_parent(&t1).unwrap().id().as_str(), "p1");
        assert_eq!(session.store().get_component_index(&t1), Some(0));

        session.redo().unwrap();
        assert_eq!(session.store().get_component_parent(&t1).unwrap().id(), &p2);
    }

    #[test]
    fn test_locked_property_disables_fields() {
        let mut session = session();
        let t1 = ComponentId::new("t1");

        session.update_component(&t1, data(json!({ "locked": true }))).unwrap();
        assert!(!session.is_draggable(&t1));

        let diff = session.update_component(&t1, data(json!({ "x": 5.0 }))).unwrap();
        assert!(diff.is_empty());

        session.undo().unwrap();
        assert!(session.is_draggable(&t1));
    }
}
