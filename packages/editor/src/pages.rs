//! Page operations for synchronized blocks
//!
//! Pages of a synchronized block cover contiguous, non-overlapping ranges of
//! the media timeline: each page's `end-time` equals the next page's
//! `start-time`. A `null` bound is open-ended.

use crate::history::GroupOptions;
use crate::session::EditSession;
use crate::store::UpdateDiff;
use crate::{EditorError, EditorResult};
use guide_common::{props, ComponentDescriptor, ComponentId, ComponentType, Data};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where to insert a sibling page relative to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PagePosition {
    Before,
    After,
}

/// Where pasted pages enter a synchronized block
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageSlot {
    pub index: usize,
    pub time: Value,
}

fn time_of(data: &Data, key: &str) -> Option<f64> {
    data.get(key).and_then(Value::as_f64)
}

impl EditSession {
    /// Whether `id` is a Block with synchronized pages
    pub fn is_synched_block(&self, id: &ComponentId) -> bool {
        self.store
            .get_component(&ComponentType::BLOCK, id)
            .and_then(|block| block.get(props::SYNCHED))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether `id` is a Page inside a synchronized Block
    pub fn is_synched_page(&self, id: &ComponentId) -> bool {
        self.store.get_component(&ComponentType::PAGE, id).is_some()
            && self
                .store
                .get_component_parent(id)
                .map(|parent| self.is_synched_block(parent.id()))
                .unwrap_or(false)
    }

    /// Insertion point for pages pasted into `block` near `target`.
    ///
    /// `None` unless `block` is synchronized and has pages. The slot follows
    /// the page at or above `target`, or the last page when `target` is the
    /// block itself.
    pub(crate) fn synched_page_slot(&self, block: &ComponentId, target: &ComponentId) -> Option<PageSlot> {
        if !self.is_synched_block(block) {
            return None;
        }

        let mut anchor = Some(target.clone());
        while let Some(id) = anchor.as_ref() {
            if self.store.component(id).and_then(|c| c.parent()) == Some(block) {
                break;
            }
            anchor = self.store.component(id).and_then(|c| c.parent()).cloned();
        }
        let anchor = anchor.or_else(|| self.store.require(block).ok()?.children().last().cloned())?;
        let index = self.store.get_component_index(&anchor)? + 1;
        let time = self
            .store
            .component(&anchor)
            .and_then(|page| page.get(props::END_TIME))
            .cloned()
            .unwrap_or(Value::Null);
        Some(PageSlot { index, time })
    }

    /// Move the adjoining boundaries of the neighbours of `page` to match a
    /// time change, recording each neighbour update.
    pub(crate) fn reconcile_page_times(&mut self, page: &ComponentId, diff: &UpdateDiff) -> EditorResult<()> {
        let Some(parent) = self.store.component(page).and_then(|c| c.parent()).cloned() else {
            return Ok(());
        };
        let Some(index) = self.store.get_component_index(page) else {
            return Ok(());
        };
        let siblings = self.store.require(&parent)?.children().to_vec();

        if let Some(start) = diff.new_values.get(props::START_TIME) {
            if let Some(previous) = index.checked_sub(1).and_then(|i| siblings.get(i)) {
                let mut partial = Data::new();
                partial.insert(props::END_TIME.to_string(), start.clone());
                self.update_recorded(previous, partial, None)?;
            }
        }

        if let Some(end) = diff.new_values.get(props::END_TIME) {
            if let Some(next) = siblings.get(index + 1) {
                let mut partial = Data::new();
                partial.insert(props::START_TIME.to_string(), end.clone());
                self.update_recorded(next, partial, None)?;
            }
        }

        Ok(())
    }

    /// Insert a new page next to `page`.
    ///
    /// In a synchronized block the page is split at the current media time:
    /// the time must fall strictly inside the page's range, otherwise
    /// [`EditorError::AddSiblingPageTime`] is returned and nothing changes.
    /// The new page becomes the selection.
    pub fn add_sibling_page(&mut self, page: &ComponentId, position: PagePosition) -> EditorResult<ComponentId> {
        let component = self
            .store
            .get_component(&ComponentType::PAGE, page)
            .ok_or_else(|| EditorError::ComponentNotFound(page.clone()))?;
        let block = component
            .parent()
            .cloned()
            .ok_or_else(|| EditorError::NotAttached(page.clone()))?;
        let index = self
            .store
            .get_component_index(page)
            .ok_or_else(|| EditorError::NotAttached(page.clone()))?;
        let insert_at = match position {
            PagePosition::Before => index,
            PagePosition::After => index + 1,
        };

        let mut new_page = ComponentDescriptor::new(ComponentType::PAGE);
        let mut boundary = Data::new();

        if self.is_synched_block(&block) {
            let time = self.media_time;
            let start = time_of(component.data(), props::START_TIME);
            let end = time_of(component.data(), props::END_TIME);

            let after_start = start.map(|s| time > s).unwrap_or(true);
            let before_end = end.map(|e| time < e).unwrap_or(true);
            if !(after_start && before_end) {
                tracing::warn!(%page, time, ?start, ?end, "sibling page rejected at page boundary");
                return Err(EditorError::AddSiblingPageTime { time });
            }

            let start = component.get(props::START_TIME).cloned().unwrap_or(Value::Null);
            let end = component.get(props::END_TIME).cloned().unwrap_or(Value::Null);
            match position {
                PagePosition::Before => {
                    new_page = new_page.with(props::START_TIME, start).with(props::END_TIME, time);
                    boundary.insert(props::START_TIME.to_string(), time.into());
                }
                PagePosition::After => {
                    new_page = new_page.with(props::START_TIME, time).with(props::END_TIME, end);
                    boundary.insert(props::END_TIME.to_string(), time.into());
                }
            }
        }

        self.grouped(GroupOptions::default(), |session| {
            // The new page takes over the split-off part, so neighbours keep
            // their boundaries.
            session.update_recorded(page, boundary, None)?;
            let id = session.store.create_from_descriptor(&new_page, false)?;
            session.insert_recorded(&id, &block, Some(insert_at))?;
            session.select_component(&id, false)?;
            tracing::debug!(%id, %block, insert_at, "sibling page added");
            Ok(id)
        })
    }
}
