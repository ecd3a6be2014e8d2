//! Document error types

use thiserror::Error;

/// Errors raised by a PDF engine
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Malformed or unsupported PDF
    #[error("Failed to decode PDF: {0}")]
    Decode(String),

    /// Page index out of range
    #[error("Page {index} not found (document has {page_count} pages)")]
    PageNotFound { index: usize, page_count: usize },

    /// Non-positive or non-finite render scale
    #[error("Invalid render scale: {0}")]
    InvalidScale(f32),

    /// Engine failed while rendering
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type alias for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
