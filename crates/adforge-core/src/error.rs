//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur while working with canvas state.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Ad size string could not be parsed as `"WxH"`.
    #[error("invalid ad size {0:?}, expected \"WxH\" (e.g. \"300x250\")")]
    InvalidAdSize(String),

    /// Element id not present in the canvas state.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// An element with this id already exists.
    #[error("duplicate element id: {0}")]
    DuplicateId(String),

    /// Element failed structural validation and cannot be inserted.
    #[error("structurally invalid element: {0}")]
    InvalidElement(String),

    /// Scene serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
