//! Artifact types

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A published output file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// File name inside the artifact root
    pub name: String,
    /// Public URL the file is served under
    pub url: String,
    /// Publish time (the file's mtime)
    pub created_at: DateTime<Utc>,
    /// Location on disk
    #[serde(skip)]
    pub path: PathBuf,
}

/// An artifact whose age exceeds the retention threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredArtifact {
    pub name: String,
    pub path: PathBuf,
    pub age: Duration,
}

impl ExpiredArtifact {
    pub fn age_seconds(&self) -> u64 {
        self.age.as_secs()
    }
}
