//! # Actions
//!
//! Named, keyboard/menu-level commands dispatched against a session.
//!
//! Handlers act on the explicit target of the context when one is given,
//! otherwise on the current selection.

use crate::pages::PagePosition;
use crate::session::EditSession;
use crate::{EditorError, EditorResult};
use guide_common::ComponentId;
use std::collections::BTreeMap;
use std::fmt;

/// Input of an action handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionContext {
    pub target: Option<ComponentId>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(target: impl Into<ComponentId>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }
}

pub type ActionHandler = fn(&mut EditSession, &ActionContext) -> EditorResult<()>;

/// Dispatch table from action names to handlers
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<&'static str, ActionHandler>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the editor's built-in actions
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("copy", copy);
        registry.register("cut", cut);
        registry.register("paste", paste);
        registry.register("delete", delete);
        registry.register("undo", |session, _| session.undo().map(drop));
        registry.register("redo", |session, _| session.redo().map(drop));
        registry.register("select-next", |session, _| {
            session.move_component_selection(false);
            Ok(())
        });
        registry.register("select-previous", |session, _| {
            session.move_component_selection(true);
            Ok(())
        });
        registry.register("lock", lock);
        registry.register("unlock", unlock);
        registry.register("add-page-before", |session, ctx| {
            add_page(session, ctx, PagePosition::Before)
        });
        registry.register("add-page-after", |session, ctx| {
            add_page(session, ctx, PagePosition::After)
        });
        registry
    }

    /// Register (or replace) a handler
    pub fn register(&mut self, name: &'static str, handler: ActionHandler) {
        self.handlers.insert(name, handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered action names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn dispatch(&self, name: &str, session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| EditorError::UnknownAction(name.to_string()))?;
        tracing::debug!(action = name, target = ?ctx.target, "dispatching action");
        handler(session, ctx)
    }
}

fn targets(session: &EditSession, ctx: &ActionContext) -> Vec<ComponentId> {
    match &ctx.target {
        Some(target) => vec![target.clone()],
        None => session.selected_ids(),
    }
}

fn copy(session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
    let ids = targets(session, ctx);
    session.copy_components(&ids).map(drop)
}

fn cut(session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
    let ids = targets(session, ctx);
    session.cut_components(&ids).map(drop)
}

fn paste(session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
    let target = ctx
        .target
        .clone()
        .or_else(|| session.selected_ids().into_iter().next())
        .or_else(|| session.store().root().cloned());
    match target {
        Some(target) => session.paste_components(&target).map(drop),
        None => Ok(()),
    }
}

fn delete(session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
    let ids = targets(session, ctx);
    session.delete_components(&ids).map(drop)
}

fn lock(session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
    for id in targets(session, ctx) {
        session.lock_component(&id)?;
    }
    Ok(())
}

fn unlock(session: &mut EditSession, ctx: &ActionContext) -> EditorResult<()> {
    for id in targets(session, ctx) {
        session.unlock_component(&id);
    }
    Ok(())
}

fn add_page(session: &mut EditSession, ctx: &ActionContext, position: PagePosition) -> EditorResult<()> {
    let Some(page) = targets(session, ctx).into_iter().next() else {
        return Ok(());
    };
    session.add_sibling_page(&page, position).map(drop)
}
