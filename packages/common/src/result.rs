use crate::error::ModelError;

/// Result type for schema-level operations
pub type ModelResult<T> = Result<T, ModelError>;
