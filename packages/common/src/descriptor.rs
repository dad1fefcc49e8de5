//! Plain component descriptors
//!
//! A descriptor is the detached, serializable form of a component subtree:
//! type, optional id, property data and nested children. Document load,
//! serialization and the clipboard all exchange descriptors.

use crate::visitor::{walk_descriptor, walk_descriptor_mut, Visitor, VisitorMut};
use crate::{ComponentId, ComponentType, Data};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    #[serde(rename = "type")]
    pub kind: ComponentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ComponentId>,

    #[serde(default)]
    pub data: Data,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentDescriptor>,
}

impl ComponentDescriptor {
    pub fn new(kind: ComponentType) -> Self {
        Self {
            kind,
            id: None,
            data: Data::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ComponentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ComponentDescriptor) -> Self {
        self.children.push(child);
        self
    }

    /// Remove ids from this descriptor and all of its descendants
    pub fn strip_ids(&mut self) {
        IdStripper.visit_descriptor_mut(self);
    }

    /// Number of descriptors in this subtree (including self)
    pub fn count(&self) -> usize {
        let mut counter = Counter(0);
        counter.visit_descriptor(self);
        counter.0
    }
}

struct Counter(usize);

impl Visitor for Counter {
    fn visit_descriptor(&mut self, descriptor: &ComponentDescriptor) {
        self.0 += 1;
        walk_descriptor(self, descriptor);
    }
}

struct IdStripper;

impl VisitorMut for IdStripper {
    fn visit_descriptor_mut(&mut self, descriptor: &mut ComponentDescriptor) {
        descriptor.id = None;
        descriptor.data.remove(crate::component::props::ID);
        walk_descriptor_mut(self, descriptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_json_shape() {
        let json = json!({
            "type": "Block",
            "id": "b1",
            "data": { "synched": true },
            "children": [
                { "type": "Page", "data": { "start-time": 0, "end-time": 10 } }
            ]
        });

        let descriptor: ComponentDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(descriptor.kind, ComponentType::BLOCK);
        assert_eq!(descriptor.id, Some(ComponentId::new("b1")));
        assert_eq!(descriptor.children.len(), 1);
        assert_eq!(descriptor.children[0].id, None);
        assert_eq!(descriptor.count(), 2);
    }

    #[test]
    fn test_strip_ids_is_recursive() {
        let mut descriptor = ComponentDescriptor::new(ComponentType::PAGE)
            .with_id("p1")
            .with("id", "p1")
            .with_child(ComponentDescriptor::new(ComponentType::TEXT).with_id("t1"));

        descriptor.strip_ids();

        assert_eq!(descriptor.id, None);
        assert!(!descriptor.data.contains_key("id"));
        assert_eq!(descriptor.children[0].id, None);
    }
}
