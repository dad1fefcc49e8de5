//! # Guide Common
//!
//! Data model shared by the editor and its collaborators: component
//! identity, per-type schemas, and detached component descriptors.

pub mod component;
pub mod descriptor;
pub mod error;
pub mod result;
pub mod schema;
pub mod visitor;

pub use component::{props, ComponentId, ComponentType, Data};
pub use descriptor::ComponentDescriptor;
pub use error::*;
pub use result::*;
pub use schema::{ChildrenSchema, FieldSchema, ModelRegistry, Schema};
pub use visitor::*;
