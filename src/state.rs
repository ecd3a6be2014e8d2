//! Application state management

use std::sync::Arc;

use crate::artifacts::{ArtifactStore, RetentionManager, StoreError};
use crate::config::Config;
use crate::document::PdfEngine;
use crate::mupdf::MupdfEngine;
use crate::pipeline::PdfService;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to prepare artifact root: {0}")]
    ArtifactRoot(#[from] StoreError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    service: PdfService,
    retention: RetentionManager,
}

impl AppState {
    /// State backed by MuPDF
    pub async fn new(config: Config) -> Result<Self, StateError> {
        Self::with_engine(config, Arc::new(MupdfEngine::new())).await
    }

    /// State backed by any engine; creates the artifact root
    pub async fn with_engine(
        config: Config,
        engine: Arc<dyn PdfEngine>,
    ) -> Result<Self, StateError> {
        let store = ArtifactStore::new(&config.storage);
        store.ensure_root().await?;

        let service = PdfService::new(engine, store, config.render.clone());
        let retention = RetentionManager::new(&config.retention);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                service,
                retention,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn service(&self) -> &PdfService {
        &self.inner.service
    }

    pub fn retention(&self) -> &RetentionManager {
        &self.inner.retention
    }
}
