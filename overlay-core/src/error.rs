//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Element not found in the canvas state.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element with the same ID is already present.
    #[error("Duplicate element ID: {0}")]
    DuplicateElement(String),

    /// A message was well-formed JSON but did not have the expected shape.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Envelope or state serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
