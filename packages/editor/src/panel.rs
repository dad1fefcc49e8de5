//! Property panel binding
//!
//! The panel reads a component's effective values for the schema fields that
//! are not disabled, and writes back one field change at a time.

use crate::session::EditSession;
use crate::store::UpdateDiff;
use crate::EditorResult;
use guide_common::{ComponentId, ComponentType, Data};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelField {
    pub name: String,
    pub value: Value,
}

/// What the property panel shows for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelView {
    pub id: ComponentId,
    pub kind: ComponentType,

    /// Editable fields, in schema order
    pub fields: Vec<PanelField>,

    /// Fields hidden from the panel by lock state
    pub disabled: Vec<String>,
}

impl PanelView {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Field-level edit emitted by the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub value: Value,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl EditSession {
    /// Panel contents for `id`
    pub fn panel_view(&self, id: &ComponentId) -> EditorResult<PanelView> {
        let component = self.store.require(id)?;
        let schema = self.store.get_model_by_type(component.kind())?;
        let effective = self.overrides.resolve(id, component.data());
        let disabled = self.store.disabled_fields(id);

        let fields = schema
            .fields
            .iter()
            .filter(|field| !disabled.contains(&field.name))
            .map(|field| PanelField {
                name: field.name.clone(),
                value: effective.get(&field.name).cloned().unwrap_or(Value::Null),
            })
            .collect();

        Ok(PanelView {
            id: id.clone(),
            kind: component.kind().clone(),
            fields,
            disabled: disabled.into_iter().collect(),
        })
    }

    /// Apply a panel edit as one undoable change
    pub fn apply_field_change(&mut self, id: &ComponentId, change: &FieldChange) -> EditorResult<UpdateDiff> {
        if self.store.disabled_fields(id).contains(&change.field) {
            tracing::warn!(%id, field = %change.field, "edit of disabled field ignored");
            return Ok(UpdateDiff::default());
        }

        let mut partial = Data::new();
        partial.insert(change.field.clone(), change.value.clone());
        self.update_component(id, partial)
    }
}
