//! # Undo/Redo History
//!
//! Linear history of reversible items.
//!
//! ## Design
//!
//! - Each item carries an `undo` and a `redo` replay closure
//! - `index` is the cursor: 0 = nothing done, `len()` = everything done
//! - Pushing with a redo tail truncates the tail
//! - Items pushed while a group is open go to the innermost group; a closed
//!   group replays as a single item
//! - A coalescing group keeps only its first `undo` and its last `redo`
//! - Consecutive top-level pushes sharing a coalesce id within the
//!   coalescing window merge into the previous item's `redo`. Items sharing
//!   a coalesce id must therefore cover the same state.
//! - While inactive or replaying, pushes are ignored
//!
//! Applying a mutation and recording it are separate steps: callers always
//! mutate first, then push the item describing how to revert and reapply it.
//!
//! ## Example
//!
//! ```rust,ignore
//! session.history_mut().push(HistoryItem::new(
//!     move |s: &mut EditSession| s.store.set_data(&id, old.clone()).map(drop),
//!     move |s: &mut EditSession| s.store.set_data(&id, new.clone()).map(drop),
//! ));
//!
//! History::undo(&mut session)?;
//! History::redo(&mut session)?;
//! ```

use crate::clock::Clock;
use crate::EditorResult;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::rc::Rc;

/// Replay closure run against the history host
pub type Replay<H> = Rc<dyn Fn(&mut H) -> EditorResult<()>>;

/// Implemented by the owner of a [`History`] so replay closures can receive
/// the whole host while the history itself is reachable from it.
pub trait HistoryHost: Sized + 'static {
    fn history(&self) -> &History<Self>;
    fn history_mut(&mut self) -> &mut History<Self>;
}

/// A reversible history item
pub struct HistoryItem<H> {
    pub undo: Replay<H>,
    pub redo: Replay<H>,

    /// Items sharing a coalesce id may be merged
    pub coalesce_id: Option<String>,
}

impl<H> Clone for HistoryItem<H> {
    fn clone(&self) -> Self {
        Self {
            undo: Rc::clone(&self.undo),
            redo: Rc::clone(&self.redo),
            coalesce_id: self.coalesce_id.clone(),
        }
    }
}

impl<H> fmt::Debug for HistoryItem<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryItem")
            .field("coalesce_id", &self.coalesce_id)
            .finish_non_exhaustive()
    }
}

impl<H: 'static> HistoryItem<H> {
    pub fn new(
        undo: impl Fn(&mut H) -> EditorResult<()> + 'static,
        redo: impl Fn(&mut H) -> EditorResult<()> + 'static,
    ) -> Self {
        Self {
            undo: Rc::new(undo),
            redo: Rc::new(redo),
            coalesce_id: None,
        }
    }

    pub fn with_coalesce_id(mut self, coalesce_id: impl Into<String>) -> Self {
        self.coalesce_id = Some(coalesce_id.into());
        self
    }
}

/// Options for [`History::start_group`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Collapse every push into one item (first undo, last redo)
    pub coalesce: bool,

    /// Coalesce id given to the item the group produces
    pub coalesce_id: Option<String>,
}

impl GroupOptions {
    pub fn coalescing(coalesce_id: impl Into<String>) -> Self {
        Self {
            coalesce: true,
            coalesce_id: Some(coalesce_id.into()),
        }
    }
}

/// An open batch of items that replays as one unit
#[derive(Debug)]
pub struct HistoryGroup<H> {
    items: Vec<HistoryItem<H>>,
    options: GroupOptions,
}

impl<H: 'static> HistoryGroup<H> {
    fn new(options: GroupOptions) -> Self {
        Self {
            items: Vec::new(),
            options,
        }
    }

    fn push(&mut self, item: HistoryItem<H>) {
        if self.options.coalesce && !self.items.is_empty() {
            self.items[0].redo = item.redo;
        } else {
            self.items.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collapse into a single item; `None` if nothing was recorded
    fn into_item(self) -> Option<HistoryItem<H>> {
        let coalesce_id = self.options.coalesce_id;
        let mut items = self.items;

        if items.len() <= 1 {
            return items.pop().map(|mut item| {
                if coalesce_id.is_some() {
                    item.coalesce_id = coalesce_id;
                }
                item
            });
        }

        let items: Rc<[HistoryItem<H>]> = items.into();
        let undo_items = Rc::clone(&items);

        let undo: Replay<H> = Rc::new(move |host: &mut H| {
            for item in undo_items.iter().rev() {
                (item.undo)(host)?;
            }
            Ok(())
        });
        let redo: Replay<H> = Rc::new(move |host: &mut H| {
            for item in items.iter() {
                (item.redo)(host)?;
            }
            Ok(())
        });

        Some(HistoryItem {
            undo,
            redo,
            coalesce_id,
        })
    }
}

/// Undo/redo history for one editing session
pub struct History<H> {
    stack: Vec<HistoryItem<H>>,
    index: usize,
    groups: Vec<HistoryGroup<H>>,
    active: bool,
    processing: bool,
    clear_pending: bool,
    last_push_at: Option<DateTime<Utc>>,
    coalesce_window: TimeDelta,
    max_levels: usize,
    clock: Rc<dyn Clock>,
}

impl<H> fmt::Debug for History<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.stack.len())
            .field("index", &self.index)
            .field("open_groups", &self.groups.len())
            .field("active", &self.active)
            .field("processing", &self.processing)
            .finish_non_exhaustive()
    }
}

impl<H: HistoryHost> History<H> {
    /// Create an active history
    pub fn new(clock: Rc<dyn Clock>, coalesce_window_ms: u64, max_levels: usize) -> Self {
        Self {
            stack: Vec::new(),
            index: 0,
            groups: Vec::new(),
            active: true,
            processing: false,
            clear_pending: false,
            last_push_at: None,
            coalesce_window: TimeDelta::milliseconds(coalesce_window_ms as i64),
            max_levels,
            clock,
        }
    }

    /// Record an item, or fold it into the open group
    pub fn push(&mut self, item: HistoryItem<H>) {
        if !self.active || self.processing {
            tracing::debug!(
                active = self.active,
                processing = self.processing,
                "history push ignored"
            );
            return;
        }

        if let Some(group) = self.groups.last_mut() {
            group.push(item);
            return;
        }

        self.push_top(item);
    }

    fn push_top(&mut self, item: HistoryItem<H>) {
        self.stack.truncate(self.index);

        let now = self.clock.now();
        let within_window = self
            .last_push_at
            .map(|last| now - last < self.coalesce_window)
            .unwrap_or(false);

        let coalesces = within_window
            && item.coalesce_id.is_some()
            && self
                .stack
                .last()
                .is_some_and(|prev| prev.coalesce_id == item.coalesce_id);

        if coalesces {
            tracing::debug!(coalesce_id = ?item.coalesce_id, "history item coalesced");
            if let Some(prev) = self.stack.last_mut() {
                prev.redo = item.redo;
            }
        } else {
            self.stack.push(item);
            self.index += 1;

            if self.max_levels > 0 && self.stack.len() > self.max_levels {
                self.stack.remove(0);
                self.index -= 1;
            }
            tracing::debug!(index = self.index, "history item pushed");
        }

        self.last_push_at = Some(now);
    }

    /// Open a (nestable) group
    pub fn start_group(&mut self, options: GroupOptions) {
        self.groups.push(HistoryGroup::new(options));
    }

    /// Close the innermost group, recording it unless `discard` is set
    pub fn end_group(&mut self, discard: bool) {
        let Some(group) = self.groups.pop() else {
            tracing::warn!("end_group called without an open group");
            return;
        };

        if discard {
            tracing::debug!(items = group.len(), "history group discarded");
            return;
        }

        let Some(item) = group.into_item() else {
            return;
        };

        match self.groups.last_mut() {
            Some(parent) => parent.push(item),
            None => self.push_top(item),
        }
    }

    /// Undo the item before the cursor. Returns `false` if nothing was undone.
    pub fn undo(host: &mut H) -> EditorResult<bool> {
        let history = host.history_mut();
        if history.processing || history.index == 0 {
            return Ok(false);
        }

        history.index -= 1;
        let item = history.stack[history.index].clone();
        history.processing = true;

        let result = (item.undo)(host);
        host.history_mut().finish_replay();

        result.map(|()| true)
    }

    /// Redo the item at the cursor. Returns `false` if nothing was redone.
    pub fn redo(host: &mut H) -> EditorResult<bool> {
        let history = host.history_mut();
        if history.processing || history.index == history.stack.len() {
            return Ok(false);
        }

        let item = history.stack[history.index].clone();
        history.processing = true;

        let result = (item.redo)(host);
        let history = host.history_mut();
        history.index += 1;
        history.finish_replay();

        result.map(|()| true)
    }

    fn finish_replay(&mut self) {
        self.processing = false;
        if self.clear_pending {
            self.clear_pending = false;
            self.reset();
        }
    }

    /// Drop all history. Deferred until an in-flight replay completes.
    pub fn clear(&mut self) {
        if self.processing {
            self.clear_pending = true;
            return;
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.groups.clear();
        self.index = 0;
        self.last_push_at = None;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn has_open_group(&self) -> bool {
        !self.groups.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.stack.len()
    }

    /// Number of top-level items
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Cursor position
    pub fn index(&self) -> usize {
        self.index
    }
}
