use crate::ComponentType;
use thiserror::Error;

/// Schema-level errors raised before any mutation happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid component type: {0}")]
    InvalidType(String),

    #[error("Missing required field `{field}` for {kind}")]
    Validation { kind: ComponentType, field: String },

    #[error("{child} cannot be a child of {parent}")]
    IncompatibleChild {
        parent: ComponentType,
        child: ComponentType,
    },
}
