//! Pipeline error types

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::artifacts::StoreError;
use crate::document::DocumentError;
use crate::geometry::RegionError;

/// Which list of an extraction request a box came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxKind {
    Figure,
    Caption,
    Redaction,
}

impl fmt::Display for BoxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoxKind::Figure => "figure",
            BoxKind::Caption => "caption",
            BoxKind::Redaction => "redaction",
        })
    }
}

/// Failure of a whole convert or extract request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to decode PDF: {0}")]
    Decode(String),

    #[error("Page {page} not found (document has {page_count} pages)")]
    PageNotFound { page: usize, page_count: usize },

    /// `index` is the box's position in its request list
    #[error("Invalid {kind} box {index} on page {page}: {source}")]
    InvalidRegion {
        page: usize,
        index: usize,
        kind: BoxKind,
        source: RegionError,
    },

    #[error("Invalid DPI {0}")]
    InvalidDpi(f32),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    /// The consumer went away before rendering finished
    #[error("Request cancelled")]
    Cancelled,

    #[error("Pipeline task failed: {0}")]
    Task(String),
}

impl From<DocumentError> for PipelineError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Decode(msg) => PipelineError::Decode(msg),
            DocumentError::PageNotFound { index, page_count } => PipelineError::PageNotFound {
                page: index,
                page_count,
            },
            DocumentError::InvalidScale(scale) => {
                PipelineError::Render(format!("invalid render scale {scale}"))
            }
            DocumentError::Render(msg) => PipelineError::Render(msg),
        }
    }
}
