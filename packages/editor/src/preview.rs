//! # Preview Binding
//!
//! Mirrors the component tree into a rendering backend.
//!
//! The binding subscribes to store events and replays them into a
//! [`Renderer`] on [`PreviewBinding::sync`]. Renderers only ever see
//! effective data, so frozen or otherwise overridden values are shown
//! without the renderer knowing about overrides.
//!
//! Subtrees are mounted top-down once their parent is mounted; components
//! created detached (paste, add) are mounted when their top node is
//! inserted.

use crate::session::EditSession;
use crate::store::{EventLog, StoreEvent};
use guide_common::{ComponentId, ComponentType, Data};
use std::collections::HashSet;

/// Rendering backend for the live preview
pub trait Renderer {
    /// Create the on-screen element of a component under `parent`
    fn mount(&mut self, id: &ComponentId, kind: &ComponentType, parent: Option<&ComponentId>, index: usize, data: &Data);

    /// Remove the element of a component and everything below it
    fn unmount(&mut self, id: &ComponentId);

    /// Refresh the element with new effective data
    fn update(&mut self, id: &ComponentId, data: &Data);
}

#[derive(Debug, Default)]
pub struct PreviewBinding {
    log: EventLog,
    mounted: HashSet<ComponentId>,
}

impl PreviewBinding {
    /// Subscribe a new binding to the session's store
    pub fn attach(session: &mut EditSession) -> Self {
        let binding = Self::default();
        session.store_mut().add_observer(Box::new(binding.log.clone()));
        binding
    }

    pub fn is_mounted(&self, id: &ComponentId) -> bool {
        self.mounted.contains(id)
    }

    /// Number of events waiting for the next sync
    pub fn pending(&self) -> usize {
        self.log.len()
    }

    /// Mount the whole document from scratch, dropping queued events
    pub fn render_all(&mut self, session: &EditSession, renderer: &mut dyn Renderer) -> usize {
        self.log.drain();
        for id in self.mounted.drain() {
            if session.store().root() == Some(&id) {
                renderer.unmount(&id);
            }
        }
        match session.store().root() {
            Some(root) => self.mount_subtree(session, renderer, root),
            None => 0,
        }
    }

    /// Replay queued store events. Returns the number of renderer calls.
    pub fn sync(&mut self, session: &EditSession, renderer: &mut dyn Renderer) -> usize {
        let mut calls = 0;
        for event in self.log.drain() {
            calls += match event {
                StoreEvent::Added { id, .. } => self.on_added(session, renderer, &id),
                StoreEvent::Removed { id, .. } => self.on_removed(session, renderer, &id),
                StoreEvent::Updated { id, .. } => self.refresh(session, renderer, &id),
            };
        }
        calls
    }

    /// Push the effective data of one mounted component
    pub fn refresh(&mut self, session: &EditSession, renderer: &mut dyn Renderer, id: &ComponentId) -> usize {
        if !self.mounted.contains(id) {
            return 0;
        }
        match session.effective_data(id) {
            Some(data) => {
                renderer.update(id, &data);
                1
            }
            None => 0,
        }
    }

    fn on_added(&mut self, session: &EditSession, renderer: &mut dyn Renderer, id: &ComponentId) -> usize {
        let store = session.store();
        let parent_mounted = store
            .component(id)
            .and_then(|c| c.parent())
            .is_some_and(|parent| self.mounted.contains(parent));

        if self.mounted.contains(id) || !parent_mounted || !store.is_attached(id) {
            return 0;
        }
        self.mount_subtree(session, renderer, id)
    }

    fn on_removed(&mut self, session: &EditSession, renderer: &mut dyn Renderer, id: &ComponentId) -> usize {
        if !self.mounted.contains(id) {
            return 0;
        }
        for member in session.store().subtree(id) {
            self.mounted.remove(&member);
        }
        renderer.unmount(id);
        1
    }

    fn mount_subtree(&mut self, session: &EditSession, renderer: &mut dyn Renderer, id: &ComponentId) -> usize {
        let store = session.store();
        let mut calls = 0;

        for member in store.subtree(id) {
            let (Some(component), Some(data)) = (store.component(&member), session.effective_data(&member)) else {
                continue;
            };
            let index = store.get_component_index(&member).unwrap_or(0);
            renderer.mount(&member, component.kind(), component.parent(), index, &data);
            self.mounted.insert(member);
            calls += 1;
        }

        tracing::debug!(%id, calls, "subtree mounted");
        calls
    }
}
