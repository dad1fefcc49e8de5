//! # Document Loading
//!
//! Replaces the whole component tree of a session with a serialized guide.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Edit → Serialize
//!   ↓      ↓        ↓
//! JSON  Mutations  Descriptor
//! ```
//!
//! Loading is not an edit: history recording is suspended while the tree is
//! built and the undo stack starts empty afterwards.

use crate::session::EditSession;
use crate::store::ComponentStore;
use crate::EditorResult;
use guide_common::{ComponentDescriptor, ComponentId};
use std::path::Path;
use std::rc::Rc;

impl EditSession {
    /// Load a document tree, keeping the ids it carries.
    /// Returns the id of the new root.
    pub fn load(&mut self, document: &ComponentDescriptor) -> EditorResult<ComponentId> {
        // Validate before tearing down the current document
        ComponentStore::new(self.store.models().clone(), Rc::clone(&self.clock)).validate_descriptor(document)?;

        let was_active = self.history.is_active();
        self.history.set_active(false);

        self.store.clear();
        self.overrides.clear();
        self.selection.clear();
        self.locks.clear();
        self.gesture = None;

        let result = self.build(document);

        self.history.set_active(was_active);
        self.history.clear();

        let root = result?;
        tracing::info!(%root, components = self.store.len(), "document loaded");
        Ok(root)
    }

    fn build(&mut self, document: &ComponentDescriptor) -> EditorResult<ComponentId> {
        let root = self.store.create_from_descriptor(document, true)?;
        self.store.set_root(&root)?;
        for id in self.store.subtree(&root) {
            self.sync_disabled_fields(&id);
        }
        Ok(root)
    }

    /// Load a document from its JSON form
    pub fn load_json(&mut self, source: &str) -> EditorResult<ComponentId> {
        let document: ComponentDescriptor = serde_json::from_str(source)?;
        self.load(&document)
    }

    /// Load a document from a JSON file
    pub fn load_file(&mut self, path: &Path) -> EditorResult<ComponentId> {
        let source = std::fs::read_to_string(path)?;
        self.load_json(&source)
    }

    /// Serialize the document to pretty-printed JSON
    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(&self.serialize()?)?)
    }

    /// Write the document to a JSON file
    pub fn save_file(&self, path: &Path) -> EditorResult<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "document saved");
        Ok(())
    }
}
