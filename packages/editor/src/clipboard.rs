//! # Clipboard
//!
//! Single-slot, format-tagged clipboard plus the copy/cut/paste operations
//! of the session.
//!
//! Copied components are stored as id-less descriptor trees, so every paste
//! creates fresh identities. Paste looks for the closest ancestor of the
//! drop target that accepts the copied types.
//!
//! Pages pasted into a synchronized block go right after the page at the
//! drop target and start out empty on the timeline: both bounds are set to
//! that page's `end-time`, so the block's pages stay contiguous.

use crate::history::GroupOptions;
use crate::session::EditSession;
use crate::EditorResult;
use guide_common::{props, ComponentDescriptor, ComponentId, ComponentType};
use serde_json::Value;

/// Clipboard format for serialized component trees
pub const COMPONENT_FORMAT: &str = "component";

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardPayload {
    pub format: String,
    pub data: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    payload: Option<ClipboardPayload>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot
    pub fn set_data(&mut self, format: impl Into<String>, data: Value) {
        self.payload = Some(ClipboardPayload {
            format: format.into(),
            data,
        });
    }

    /// Data of the slot if it holds `format`
    pub fn get_data(&self, format: &str) -> Option<&Value> {
        self.payload
            .as_ref()
            .filter(|payload| payload.format == format)
            .map(|payload| &payload.data)
    }

    pub fn format(&self) -> Option<&str> {
        self.payload.as_ref().map(|payload| payload.format.as_str())
    }

    pub fn clear(&mut self) {
        self.payload = None;
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

fn nudge(descriptor: &mut ComponentDescriptor, key: &str, offset: f64) {
    if let Some(value) = descriptor.data.get(key).and_then(Value::as_f64) {
        descriptor.data.insert(key.to_string(), (value + offset).into());
    }
}

impl EditSession {
    /// Copy components to the clipboard, in document order.
    /// Returns the number of components copied.
    pub fn copy_components(&mut self, ids: &[ComponentId]) -> EditorResult<usize> {
        // Nested selections are covered by their ancestor
        let mut ordered: Vec<&ComponentId> = ids
            .iter()
            .filter(|id| self.store.is_attached(id))
            .filter(|id| !ids.iter().any(|other| self.store.is_descendant_of(id, other)))
            .collect();
        ordered.sort_by_cached_key(|id| (self.store.index_path(id), (*id).clone()));
        ordered.dedup();

        let mut descriptors = Vec::with_capacity(ordered.len());
        for id in ordered {
            let mut descriptor = self.store.to_descriptor(id, false)?;
            descriptor.strip_ids();
            descriptors.push(descriptor);
        }

        let count = descriptors.len();
        if count > 0 {
            self.clipboard
                .set_data(COMPONENT_FORMAT, serde_json::to_value(&descriptors)?);
            tracing::info!(count, "components copied");
        }
        Ok(count)
    }

    /// Copy, then delete the originals as one undoable step
    pub fn cut_components(&mut self, ids: &[ComponentId]) -> EditorResult<usize> {
        let count = self.copy_components(ids)?;
        if count > 0 {
            self.delete_components(ids)?;
        }
        Ok(count)
    }

    /// Closest component, starting at `target` and walking up, that accepts
    /// every one of `kinds` as a child
    pub fn closest_paste_target(&self, target: &ComponentId, kinds: &[ComponentType]) -> Option<ComponentId> {
        let mut current = self.store.component(target);
        while let Some(component) = current {
            let accepts = self
                .store
                .models()
                .get(component.kind())
                .map(|schema| kinds.iter().all(|kind| schema.accepts_child(kind)))
                .unwrap_or(false);
            if accepts && self.store.is_attached(component.id()) {
                return Some(component.id().clone());
            }
            current = self.store.get_component_parent(component.id());
        }
        None
    }

    /// Paste the clipboard near `target`. Returns the ids of the new
    /// top-level components; empty when there is nothing valid to paste.
    pub fn paste_components(&mut self, target: &ComponentId) -> EditorResult<Vec<ComponentId>> {
        let Some(data) = self.clipboard.get_data(COMPONENT_FORMAT) else {
            return Ok(Vec::new());
        };
        let mut descriptors: Vec<ComponentDescriptor> = serde_json::from_value(data.clone())?;
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let kinds: Vec<ComponentType> = descriptors.iter().map(|d| d.kind.clone()).collect();
        let Some(parent) = self.closest_paste_target(target, &kinds) else {
            tracing::warn!(%target, "no valid paste target");
            return Ok(Vec::new());
        };

        let slot = self.synched_page_slot(&parent, target);
        let offset = self.config.paste_offset;
        for descriptor in &mut descriptors {
            descriptor.strip_ids();
            nudge(descriptor, props::X, offset);
            nudge(descriptor, props::Y, offset);
            if let Some(slot) = &slot {
                descriptor.data.insert(props::START_TIME.to_string(), slot.time.clone());
                descriptor.data.insert(props::END_TIME.to_string(), slot.time.clone());
            }
            self.store.validate_descriptor(descriptor)?;
        }

        let mut index = slot.as_ref().map(|slot| slot.index);
        let pasted = self.grouped(GroupOptions::default(), |session| {
            let mut pasted = Vec::with_capacity(descriptors.len());
            for descriptor in &descriptors {
                let id = session.store.create_from_descriptor(descriptor, false)?;
                session.insert_recorded(&id, &parent, index)?;
                index = index.map(|i| i + 1);
                pasted.push(id);
            }
            Ok(pasted)
        })?;

        self.deselect_all_components();
        for id in &pasted {
            self.select_component(id, true)?;
        }
        let components: usize = descriptors.iter().map(ComponentDescriptor::count).sum();
        tracing::info!(count = pasted.len(), components, %parent, "components pasted");

        Ok(pasted)
    }
}
