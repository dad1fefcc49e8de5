//! Component identity and property data

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Property map of a component (property name → value)
pub type Data = serde_json::Map<String, serde_json::Value>;

/// Opaque, stable component identifier (unique within a document)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Component type name.
///
/// The built-in types are exposed as associated constants. Other names are
/// valid as long as a schema is registered for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(Cow<'static, str>);

impl ComponentType {
    pub const SCENARIO: ComponentType = ComponentType(Cow::Borrowed("Scenario"));
    pub const BLOCK: ComponentType = ComponentType(Cow::Borrowed("Block"));
    pub const PAGE: ComponentType = ComponentType(Cow::Borrowed("Page"));
    pub const CURSOR: ComponentType = ComponentType(Cow::Borrowed("Cursor"));
    pub const IMAGE: ComponentType = ComponentType(Cow::Borrowed("Image"));
    pub const TEXT: ComponentType = ComponentType(Cow::Borrowed("Text"));
    pub const CONTROLLER: ComponentType = ComponentType(Cow::Borrowed("Controller"));
    pub const BLOCK_TOGGLER: ComponentType = ComponentType(Cow::Borrowed("BlockToggler"));
    pub const MEDIA: ComponentType = ComponentType(Cow::Borrowed("Media"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known property names shared across component types
pub mod props {
    pub const ID: &str = "id";
    pub const TYPE: &str = "type";
    pub const NAME: &str = "name";
    pub const LOCKED: &str = "locked";
    pub const HIDDEN: &str = "hidden";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const START_TIME: &str = "start-time";
    pub const END_TIME: &str = "end-time";
    pub const SYNCHED: &str = "synched";
}
