//! # Component Models
//!
//! Static per-type schemas: property defaults, required fields, and the
//! children-holding property with its allowed child types.
//!
//! Code that needs to reason about structure (selection, copy/paste, property
//! panels) goes through [`ModelRegistry`] instead of branching on concrete
//! component types.

use crate::component::props;
use crate::{ComponentType, Data, ModelError, ModelResult};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Schema of a single property
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,

    /// Value used when the property is not supplied at creation
    pub default: Value,

    /// Creation fails when a required property is missing
    pub required: bool,

    /// Disabled in property panels while the component is locked
    pub lockable: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default,
            required: false,
            lockable: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn lockable(mut self) -> Self {
        self.lockable = true;
        self
    }
}

/// Children-holding property of a schema
#[derive(Debug, Clone, PartialEq)]
pub struct ChildrenSchema {
    /// Property name used when (de)serializing children
    pub property: String,

    /// Component types accepted as children
    pub allowed: Vec<ComponentType>,
}

/// Static model of one component type
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: ComponentType,
    pub fields: Vec<FieldSchema>,
    pub children: Option<ChildrenSchema>,
}

impl Schema {
    pub fn new(kind: ComponentType) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            children: None,
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_children(mut self, property: impl Into<String>, allowed: Vec<ComponentType>) -> Self {
        self.children = Some(ChildrenSchema {
            property: property.into(),
            allowed,
        });
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this schema accepts `kind` as a child
    pub fn accepts_child(&self, kind: &ComponentType) -> bool {
        self.children
            .as_ref()
            .map(|c| c.allowed.contains(kind))
            .unwrap_or(false)
    }

    /// Names of the fields disabled while locked
    pub fn lockable_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.lockable).map(|f| f.name.as_str())
    }
}

/// Registry of component schemas, keyed by type
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<ComponentType, Schema>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in guide component types
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for schema in builtin_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Register (or replace) a schema
    pub fn register(&mut self, schema: Schema) {
        self.models.insert(schema.kind.clone(), schema);
    }

    pub fn contains(&self, kind: &ComponentType) -> bool {
        self.models.contains_key(kind)
    }

    /// Look up the schema of a type
    pub fn get(&self, kind: &ComponentType) -> ModelResult<&Schema> {
        self.models
            .get(kind)
            .ok_or_else(|| ModelError::InvalidType(kind.to_string()))
    }

    /// Fill defaults and check required fields.
    ///
    /// Keys unknown to the schema are kept as-is.
    pub fn validate(&self, kind: &ComponentType, data: &Data) -> ModelResult<Data> {
        let schema = self.get(kind)?;
        let mut out = data.clone();

        for field in &schema.fields {
            if out.contains_key(&field.name) {
                continue;
            }
            if field.required {
                return Err(ModelError::Validation {
                    kind: kind.clone(),
                    field: field.name.clone(),
                });
            }
            out.insert(field.name.clone(), field.default.clone());
        }

        Ok(out)
    }

    /// Ensure `parent` accepts `child` as a child type
    pub fn check_child(&self, parent: &ComponentType, child: &ComponentType) -> ModelResult<()> {
        if self.get(parent)?.accepts_child(child) {
            Ok(())
        } else {
            Err(ModelError::IncompatibleChild {
                parent: parent.clone(),
                child: child.clone(),
            })
        }
    }
}

fn common_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new(props::NAME, json!("")),
        FieldSchema::new(props::HIDDEN, json!(false)),
        FieldSchema::new(props::LOCKED, json!(false)),
    ]
}

fn positional_fields(width: f64, height: f64) -> Vec<FieldSchema> {
    vec![
        FieldSchema::new(props::X, json!(0.0)).lockable(),
        FieldSchema::new(props::Y, json!(0.0)).lockable(),
        FieldSchema::new(props::WIDTH, json!(width)).lockable(),
        FieldSchema::new(props::HEIGHT, json!(height)).lockable(),
    ]
}

fn time_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new(props::START_TIME, Value::Null),
        FieldSchema::new(props::END_TIME, Value::Null),
    ]
}

fn element_elements() -> Vec<ComponentType> {
    vec![ComponentType::CURSOR, ComponentType::IMAGE, ComponentType::TEXT]
}

fn builtin_schemas() -> Vec<Schema> {
    vec![
        Schema::new(ComponentType::SCENARIO)
            .fields(common_fields())
            .with_children(
                "children",
                vec![
                    ComponentType::BLOCK,
                    ComponentType::MEDIA,
                    ComponentType::CONTROLLER,
                    ComponentType::BLOCK_TOGGLER,
                ],
            ),
        Schema::new(ComponentType::BLOCK)
            .fields(common_fields())
            .fields(positional_fields(200.0, 200.0))
            .field(FieldSchema::new(props::SYNCHED, json!(true)))
            .field(FieldSchema::new("background-color", Value::Null))
            .with_children("pages", vec![ComponentType::PAGE]),
        Schema::new(ComponentType::PAGE)
            .fields(time_fields())
            .field(FieldSchema::new("background-color", Value::Null))
            .with_children("children", element_elements()),
        Schema::new(ComponentType::CURSOR)
            .fields(common_fields())
            .fields(positional_fields(50.0, 50.0))
            .fields(time_fields())
            .field(FieldSchema::new("direction", json!("right")))
            .field(FieldSchema::new("cursor-width", json!(1.0)))
            .field(FieldSchema::new("keyframes", json!([]))),
        Schema::new(ComponentType::IMAGE)
            .fields(common_fields())
            .fields(positional_fields(50.0, 50.0))
            .fields(time_fields())
            .field(FieldSchema::new("src", Value::Null)),
        Schema::new(ComponentType::TEXT)
            .fields(common_fields())
            .fields(positional_fields(50.0, 50.0))
            .fields(time_fields())
            .field(FieldSchema::new("text", json!(""))),
        Schema::new(ComponentType::MEDIA)
            .fields(common_fields())
            .fields(positional_fields(320.0, 240.0))
            .field(FieldSchema::new("src", Value::Null).required()),
        Schema::new(ComponentType::CONTROLLER)
            .fields(common_fields())
            .fields(positional_fields(120.0, 40.0)),
        Schema::new(ComponentType::BLOCK_TOGGLER)
            .fields(common_fields())
            .fields(positional_fields(100.0, 20.0))
            .field(FieldSchema::new("blocks", json!([]))),
    ]
}
