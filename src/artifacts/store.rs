//! Artifact store
//!
//! Writes images into the artifact root. Each request gets an
//! [`ArtifactBatch`] whose UUID prefixes every name it writes, so concurrent
//! requests can never collide on a file name.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::types::Artifact;
use super::PARTIAL_SUFFIX;
use crate::config::StorageConfig;
use crate::raster::RasterImage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write artifact '{name}': {source}")]
    Write { name: String, source: io::Error },

    #[error("Failed to encode artifact '{name}': {source}")]
    Encode {
        name: String,
        source: image::ImageError,
    },

    #[error("Artifact name '{0}' was already written by this batch")]
    DuplicateName(String),

    #[error("Invalid artifact name '{0}'")]
    InvalidName(String),

    #[error("Failed to create artifact root {}: {source}", path.display())]
    Root { path: PathBuf, source: io::Error },

    #[error("Encoder task failed: {0}")]
    Task(String),
}

/// Name-addressed image storage under a single root directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    url_prefix: String,
}

impl ArtifactStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if needed
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Root {
                path: self.root.clone(),
                source,
            })
    }

    /// Start a new naming namespace for one request
    pub fn batch(&self) -> ArtifactBatch {
        ArtifactBatch {
            store: self.clone(),
            id: Uuid::new_v4(),
            used: HashSet::new(),
        }
    }

    /// Save a single image under a fresh namespace
    pub async fn save(&self, image: RasterImage, suggested: &str) -> Result<Artifact, StoreError> {
        self.batch().save(image, suggested).await
    }

    /// Public URL of an artifact
    pub fn url_for(&self, artifact: &Artifact) -> String {
        self.url_for_name(&artifact.name)
    }

    pub(crate) fn url_for_name(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix, name)
    }

    /// Write-then-rename so readers only ever see complete files
    async fn publish(&self, name: &str, data: &[u8]) -> Result<Artifact, StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            name: name.to_string(),
            source,
        };

        let path = self.root.join(name);
        let partial = self.root.join(format!(".{name}{PARTIAL_SUFFIX}"));

        // The mtime is read before the rename: once published, a sweep may
        // remove the file at any moment.
        let modified = match write_partial(&partial, data).await {
            Ok(modified) => modified,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(write_err(e));
            }
        };
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_err(e));
        }

        tracing::debug!(name = %name, bytes = data.len(), "Published artifact");

        Ok(Artifact {
            name: name.to_string(),
            url: self.url_for_name(name),
            created_at: DateTime::<Utc>::from(modified),
            path,
        })
    }
}

/// Write and flush `data`, returning the file's mtime
async fn write_partial(path: &Path, data: &[u8]) -> io::Result<SystemTime> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    file.metadata().await?.modified()
}

/// Per-request namespace: `<uuid>-<suggested>.png`
#[derive(Debug)]
pub struct ArtifactBatch {
    store: ArtifactStore,
    id: Uuid,
    used: HashSet<String>,
}

impl ArtifactBatch {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Encode `image` as PNG and publish it
    ///
    /// Takes ownership of the image; it is encoded on the blocking pool.
    pub async fn save(&mut self, image: RasterImage, suggested: &str) -> Result<Artifact, StoreError> {
        if !is_valid_suggestion(suggested) {
            return Err(StoreError::InvalidName(suggested.to_string()));
        }

        let name = format!("{}-{}.png", self.id.simple(), suggested);
        if !self.used.insert(name.clone()) {
            return Err(StoreError::DuplicateName(name));
        }

        let png = tokio::task::spawn_blocking(move || image.encode_png())
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(|source| StoreError::Encode {
                name: name.clone(),
                source,
            })?;

        self.store.publish(&name, &png).await
    }
}

fn is_valid_suggestion(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
