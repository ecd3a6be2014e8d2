//! Generated-file lifecycle
//!
//! Every image the service produces is an [`Artifact`]: a file in one flat
//! directory, published atomically by the [`ArtifactStore`] and eventually
//! removed by the [`RetentionManager`].
//!
//! ```text
//!   ArtifactBatch::save ──▶ .name.partial ──rename──▶ name.png
//!                                                        │
//!   RetentionManager::delete_expired ◀── mtime age ──────┘
//! ```
//!
//! The root directory is the only state shared between the two, and no lock
//! guards it: creation only ever adds new names, and deleting a name that is
//! already gone is not an error.

mod retention;
mod store;
mod types;

pub use retention::{
    delete_expired, list_expired, scan_expired, ExpiredScan, RetentionError, RetentionManager,
    PARTIAL_GRACE,
};
pub use store::{ArtifactBatch, ArtifactStore, StoreError};
pub use types::{Artifact, ExpiredArtifact};

/// Suffix of in-flight writes; never reported as artifacts
pub(crate) const PARTIAL_SUFFIX: &str = ".partial";

/// Whether a directory entry name belongs to a published artifact
pub(crate) fn is_published_name(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(PARTIAL_SUFFIX)
}
