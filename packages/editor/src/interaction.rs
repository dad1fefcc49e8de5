//! # Direct Manipulation
//!
//! Drag, resize and click events emitted by the preview renderer.
//!
//! A gesture opens a coalescing history group on its start event.
//! Intermediate events update the store without recording, so the preview
//! follows the pointer. The end event records the start and end values of
//! all the keys the gesture may change as one item and closes the group.
//!
//! Components that are locked (registry or `locked` property) are not
//! draggable: their start event is rejected and the rest of the gesture is
//! ignored.

use crate::history::GroupOptions;
use crate::session::{EditSession, Gesture};
use crate::store::UpdateDiff;
use crate::EditorResult;
use guide_common::{props, ComponentId, Data};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    DragStart,
    Drag,
    DragEnd,
    ResizeStart,
    Resize,
    ResizeEnd,
    Click,
}

impl InteractionKind {
    fn gesture_name(self) -> &'static str {
        match self {
            Self::DragStart | Self::Drag | Self::DragEnd => "drag",
            Self::ResizeStart | Self::Resize | Self::ResizeEnd => "resize",
            Self::Click => "click",
        }
    }

    /// Properties a gesture of this kind may change
    fn gesture_keys(self) -> &'static [&'static str] {
        match self {
            Self::DragStart | Self::Drag | Self::DragEnd => &[props::X, props::Y],
            Self::ResizeStart | Self::Resize | Self::ResizeEnd => {
                &[props::X, props::Y, props::WIDTH, props::HEIGHT]
            }
            Self::Click => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionDetail {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,

    /// Add to the selection instead of replacing it (click only)
    pub append: bool,
}

impl InteractionDetail {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn bounds(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            append: false,
        }
    }

    fn values(&self, keys: &[&str]) -> Data {
        let mut data = Data::new();
        let pairs = [
            (props::X, self.x),
            (props::Y, self.y),
            (props::WIDTH, self.width),
            (props::HEIGHT, self.height),
        ];
        for (key, value) in pairs {
            if let Some(value) = value.filter(|_| keys.contains(&key)) {
                data.insert(key.to_string(), value.into());
            }
        }
        data
    }
}

/// Raw interaction coming back from the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub component: ComponentId,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub detail: InteractionDetail,
}

impl InteractionEvent {
    pub fn new(component: impl Into<ComponentId>, kind: InteractionKind, detail: InteractionDetail) -> Self {
        Self {
            component: component.into(),
            kind,
            detail,
        }
    }
}

impl EditSession {
    /// Apply a renderer interaction. Returns whether it had any effect.
    pub fn handle_interaction(&mut self, event: &InteractionEvent) -> EditorResult<bool> {
        use InteractionKind::*;

        self.store.require(&event.component)?;
        match event.kind {
            DragStart | ResizeStart => Ok(self.begin_gesture(event)),
            Drag | Resize => self.continue_gesture(event),
            DragEnd | ResizeEnd => self.end_gesture(event),
            Click => {
                self.select_component(&event.component, event.detail.append)?;
                Ok(true)
            }
        }
    }

    /// Whether a drag/resize gesture is in progress
    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    fn begin_gesture(&mut self, event: &InteractionEvent) -> bool {
        let id = &event.component;
        if !self.is_draggable(id) {
            tracing::warn!(%id, gesture = event.kind.gesture_name(), "locked component ignores gesture");
            return false;
        }

        if let Some(stale) = self.gesture.take() {
            tracing::warn!(id = %stale.id, "unfinished gesture closed");
            self.history.end_group(true);
        }

        let start: Data = match self.store.component(id) {
            Some(component) => event
                .kind
                .gesture_keys()
                .iter()
                .map(|key| (key.to_string(), component.get(key).cloned().unwrap_or(Value::Null)))
                .collect(),
            None => return false,
        };

        self.history.start_group(GroupOptions::coalescing(format!(
            "{}:{}",
            event.kind.gesture_name(),
            id
        )));
        self.gesture = Some(Gesture { id: id.clone(), start });
        true
    }

    fn continue_gesture(&mut self, event: &InteractionEvent) -> EditorResult<bool> {
        if !self.owns_gesture(&event.component) {
            return Ok(false);
        }
        let partial = event.detail.values(event.kind.gesture_keys());
        let diff = self.store.update_component(&event.component, partial)?;
        Ok(!diff.is_empty())
    }

    fn end_gesture(&mut self, event: &InteractionEvent) -> EditorResult<bool> {
        if !self.owns_gesture(&event.component) {
            return Ok(false);
        }
        let Some(Gesture { id, start }) = self.gesture.take() else {
            return Ok(false);
        };

        let partial = event.detail.values(event.kind.gesture_keys());
        if let Err(err) = self.store.update_component(&id, partial) {
            self.history.end_group(true);
            return Err(err);
        }

        // Every gesture key is recorded once anything moved, so that items
        // merged by coalescing still restore the full start position
        let mut diff = UpdateDiff::default();
        if let Some(component) = self.store.component(&id) {
            let end: Data = start
                .keys()
                .map(|key| (key.clone(), component.get(key).cloned().unwrap_or(Value::Null)))
                .collect();
            if end != start {
                diff.old_values = start;
                diff.new_values = end;
            }
        }

        self.record_diff(&id, &diff, None);
        self.history.end_group(diff.is_empty());
        tracing::debug!(%id, recorded = !diff.is_empty(), "gesture finished");

        Ok(!diff.is_empty())
    }

    fn owns_gesture(&self, id: &ComponentId) -> bool {
        self.gesture.as_ref().is_some_and(|gesture| &gesture.id == id)
    }
}
