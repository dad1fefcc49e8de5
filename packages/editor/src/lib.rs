//! # Guide Editor
//!
//! Editing engine for time-synchronized guides.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ renderer / property panel                   │
//! │  - interaction events, field changes        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EditSession: actions + recorded mutations   │
//! │  - validate, mutate the store               │
//! │  - push reversible items into History       │
//! │  - keep selection/locks/overrides in sync   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ComponentStore → StoreEvent → Renderer      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Store is source of truth**: renderers and panels read effective data
//!    (canonical data shadowed by overrides)
//! 2. **Mutate, then record**: every mutation is applied immediately; history
//!    items only describe how to revert and reapply it
//! 3. **Validate before mutating**: a failed operation leaves no trace
//! 4. **Coarse undo**: gestures and compound edits are one undo step
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guide_editor::{EditSession, EditorConfig, FieldChange};
//!
//! let mut session = EditSession::new(EditorConfig::load(".")?);
//! session.load_json(&source)?;
//!
//! session.apply_field_change(&"t1".into(), &FieldChange::new("text", "Hello"))?;
//! session.undo()?;
//! ```

mod actions;
mod clipboard;
mod clock;
mod config;
mod document;
mod errors;
mod history;
mod interaction;
mod mutations;
mod overrides;
mod pages;
mod panel;
mod preview;
mod selection;
mod session;
mod store;

pub use actions::{ActionContext, ActionHandler, ActionRegistry};
pub use clipboard::{Clipboard, ClipboardPayload, COMPONENT_FORMAT};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::{EditorError, EditorResult};
pub use history::{GroupOptions, History, HistoryGroup, HistoryHost, HistoryItem, Replay};
pub use interaction::{InteractionDetail, InteractionEvent, InteractionKind};
pub use overrides::{Overrides, FROZEN_REASON};
pub use pages::PagePosition;
pub use panel::{FieldChange, PanelField, PanelView};
pub use preview::{PreviewBinding, Renderer};
pub use selection::SelectionSet;
pub use session::EditSession;
pub use store::{Component, ComponentStore, DirtySet, EventLog, StoreEvent, StoreObserver, UpdateDiff};

// Re-export the shared model for convenience
pub use guide_common::{props, ComponentDescriptor, ComponentId, ComponentType, Data, ModelError, ModelRegistry};
