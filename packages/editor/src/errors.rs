//! Error types for the editor

use guide_common::{ComponentId, ModelError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentId),

    #[error("Component id already in use: {0}")]
    DuplicateId(ComponentId),

    #[error("Adding {0} there would create a cycle")]
    Cycle(ComponentId),

    #[error("Component {0} is not part of the document tree")]
    NotAttached(ComponentId),

    #[error("Cannot add a page at {time}s: it falls on an existing page boundary")]
    AddSiblingPageTime { time: f64 },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
