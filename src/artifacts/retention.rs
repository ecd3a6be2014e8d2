//! Retention sweeps over the artifact root
//!
//! Each artifact is FRESH while `now - mtime <= threshold`, EXPIRED after
//! that, and DELETED once a sweep removes it. The scan is a lazy iterator over
//! the directory, so memory stays flat however many files the root holds.
//!
//! Sweeps tolerate a directory that changes underneath them:
//! - a file created mid-scan may or may not be seen
//! - a file removed mid-scan (by another sweep) is skipped
//! - a delete that finds the file already gone is not counted and not an error

use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;

use super::types::ExpiredArtifact;
use super::{is_published_name, PARTIAL_SUFFIX};
use crate::config::RetentionConfig;

/// Minimum age before a sweep may remove an in-flight `.partial` write,
/// whatever the requested threshold
pub const PARTIAL_GRACE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Failed to scan artifact root {}: {source}", root.display())]
    ScanFailure { root: PathBuf, source: io::Error },

    #[error("Retention task failed: {0}")]
    Task(String),
}

/// Lazy sequence of expired entries in one directory
#[derive(Debug)]
pub struct ExpiredScan {
    entries: Option<ReadDir>,
    threshold: Duration,
    now: SystemTime,
    include_partial: bool,
}

impl Iterator for ExpiredScan {
    type Item = ExpiredArtifact;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;
        for entry in entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let threshold = if is_published_name(&name) {
                self.threshold
            } else if self.include_partial && name.ends_with(PARTIAL_SUFFIX) {
                self.threshold.max(PARTIAL_GRACE)
            } else {
                continue;
            };

            // Gone already, or not a regular file
            let modified = match entry.metadata() {
                Ok(meta) if meta.is_file() => match meta.modified() {
                    Ok(modified) => modified,
                    Err(_) => continue,
                },
                _ => continue,
            };

            let age = self.now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age > threshold {
                return Some(ExpiredArtifact {
                    name,
                    path: entry.path(),
                    age,
                });
            }
        }
        None
    }
}

/// Start a non-recursive scan of `root` for published artifacts older than
/// `threshold` at `now`
///
/// A missing root is treated as empty.
pub fn scan_expired(
    root: &Path,
    threshold: Duration,
    now: SystemTime,
) -> Result<ExpiredScan, RetentionError> {
    open_scan(root, threshold, now, false)
}

fn open_scan(
    root: &Path,
    threshold: Duration,
    now: SystemTime,
    include_partial: bool,
) -> Result<ExpiredScan, RetentionError> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => Some(entries),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(RetentionError::ScanFailure {
                root: root.to_path_buf(),
                source,
            })
        }
    };

    Ok(ExpiredScan {
        entries,
        threshold,
        now,
        include_partial,
    })
}

/// All expired artifacts under `root`
pub fn list_expired(
    root: &Path,
    threshold: Duration,
    now: SystemTime,
) -> Result<Vec<ExpiredArtifact>, RetentionError> {
    Ok(scan_expired(root, threshold, now)?.collect())
}

/// Remove every expired artifact under `root`, returning how many this call
/// removed
///
/// Abandoned partial writes are removed as well but not counted. A partial is
/// only abandoned once it is older than both the threshold and
/// [`PARTIAL_GRACE`], so a sweep never races a save that is still writing.
pub fn delete_expired(
    root: &Path,
    threshold: Duration,
    now: SystemTime,
) -> Result<usize, RetentionError> {
    let mut deleted = 0;

    for expired in open_scan(root, threshold, now, true)? {
        match fs::remove_file(&expired.path) {
            Ok(()) if is_published_name(&expired.name) => {
                tracing::debug!(name = %expired.name, age_secs = expired.age_seconds(), "Deleted expired artifact");
                deleted += 1;
            }
            Ok(()) => {
                tracing::debug!(name = %expired.name, "Removed abandoned partial write");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(name = %expired.name, "Artifact already removed");
            }
            Err(e) => {
                tracing::warn!(name = %expired.name, error = %e, "Failed to delete expired artifact");
            }
        }
    }

    Ok(deleted)
}

/// Retention sweeps bound to a configured root and threshold
#[derive(Debug, Clone)]
pub struct RetentionManager {
    root: PathBuf,
    threshold: Duration,
}

impl RetentionManager {
    pub fn new(config: &RetentionConfig) -> Self {
        Self {
            root: config.root.clone(),
            threshold: config.threshold,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Expired artifacts as of now
    pub async fn list_expired(
        &self,
        threshold: Option<Duration>,
    ) -> Result<Vec<ExpiredArtifact>, RetentionError> {
        self.list_expired_at(threshold, SystemTime::now()).await
    }

    /// Expired artifacts as of `now`
    pub async fn list_expired_at(
        &self,
        threshold: Option<Duration>,
        now: SystemTime,
    ) -> Result<Vec<ExpiredArtifact>, RetentionError> {
        let root = self.root.clone();
        let threshold = threshold.unwrap_or(self.threshold);
        tokio::task::spawn_blocking(move || list_expired(&root, threshold, now))
            .await
            .map_err(|e| RetentionError::Task(e.to_string()))?
    }

    /// Delete expired artifacts as of now
    pub async fn delete_expired(&self, threshold: Option<Duration>) -> Result<usize, RetentionError> {
        self.delete_expired_at(threshold, SystemTime::now()).await
    }

    /// Delete expired artifacts as of `now`
    pub async fn delete_expired_at(
        &self,
        threshold: Option<Duration>,
        now: SystemTime,
    ) -> Result<usize, RetentionError> {
        let root = self.root.clone();
        let threshold = threshold.unwrap_or(self.threshold);
        let deleted = tokio::task::spawn_blocking(move || delete_expired(&root, threshold, now))
            .await
            .map_err(|e| RetentionError::Task(e.to_string()))??;

        tracing::info!(deleted, threshold_secs = threshold.as_secs(), "Retention sweep finished");
        Ok(deleted)
    }
}
