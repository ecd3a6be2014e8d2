//! Document processing pipeline
//!
//! Two request-level operations:
//!
//! - [`PdfService::convert_to_images`]: one PNG per page, in page order
//! - [`PdfService::extract_figures`]: cropped figures (and captions) plus one
//!   redacted render per page that had boxes
//!
//! # Design
//!
//! ```text
//!   spawn_blocking                           async request task
//!  ┌──────────────────────────┐   mpsc(4)   ┌──────────────────────────┐
//!  │ open → render → crop/    │ ──────────▶ │ ArtifactBatch::save      │
//!  │ redact (one document)    │             │ (encode + write + rename)│
//!  └──────────────────────────┘             └──────────────────────────┘
//! ```
//!
//! The document handle never leaves the blocking thread. If the request is
//! dropped or a write fails, the receiver goes away and the renderer stops at
//! its next send.

mod convert;
mod error;
mod figures;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::artifacts::{Artifact, ArtifactStore};
use crate::config::RenderConfig;
use crate::document::PdfEngine;
use crate::geometry::{BoundingBox, CoordinateSpace, POINTS_PER_INCH};
use crate::raster::RasterImage;

pub use error::{BoxKind, PipelineError};

/// Rendered images buffered between the renderer and the writer
const CHANNEL_DEPTH: usize = 4;

/// Highest DPI accepted as a per-request override
pub const MAX_DPI: f32 = 600.0;

/// A figure to extract, with an optional caption region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureRequest {
    pub page: usize,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub caption: Option<BoundingBox>,
}

/// A region to redact without extracting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRequest {
    pub page: usize,
    pub bbox: BoundingBox,
}

/// Input of [`PdfService::extract_figures`]
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub figures: Vec<FigureRequest>,
    pub redactions: Vec<RedactionRequest>,
    /// Space every box in this request is expressed in
    pub space: CoordinateSpace,
}

/// Stored figure, tagged with its position in the request
#[derive(Debug, Clone, Serialize)]
pub struct FigureArtifacts {
    pub page: usize,
    pub index: usize,
    pub figure: Artifact,
    pub caption: Option<Artifact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedactedPageArtifact {
    pub page: usize,
    pub artifact: Artifact,
}

/// Output of [`PdfService::extract_figures`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    /// Same order as the request's figure list
    pub figures: Vec<FigureArtifacts>,
    /// Ascending page order
    pub redacted_pages: Vec<RedactedPageArtifact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageRole {
    Page,
    Figure(usize),
    Caption(usize),
    Redacted,
}

/// An image on its way from the renderer to the store
pub(crate) struct RenderedImage {
    pub page: usize,
    pub role: ImageRole,
    pub image: RasterImage,
}

impl RenderedImage {
    fn suggested_name(&self) -> String {
        let page = self.page;
        match self.role {
            ImageRole::Page => format!("page{page}"),
            ImageRole::Figure(index) => format!("page{page}-figure{index}"),
            ImageRole::Caption(index) => format!("page{page}-caption{index}"),
            ImageRole::Redacted => format!("page{page}-redacted"),
        }
    }
}

pub(crate) type ImageSender = mpsc::Sender<RenderedImage>;

/// Hand an image to the writer; fails once the writer has gone away
pub(crate) fn emit(tx: &ImageSender, rendered: RenderedImage) -> Result<(), PipelineError> {
    tx.blocking_send(rendered).map_err(|_| PipelineError::Cancelled)
}

struct StoredImage {
    page: usize,
    role: ImageRole,
    artifact: Artifact,
}

/// Put stored extract images back into request order
fn assemble_extract(
    stored: Vec<StoredImage>,
    figure_count: usize,
) -> Result<ExtractResult, PipelineError> {
    let mut slots: Vec<Option<FigureArtifacts>> = vec![None; figure_count];
    let mut redacted_pages = Vec::new();

    for StoredImage {
        page,
        role,
        artifact,
    } in stored
    {
        match role {
            ImageRole::Figure(index) => {
                let slot = slots.get_mut(index).ok_or_else(|| {
                    PipelineError::Task(format!("figure {index} is not in the request"))
                })?;
                *slot = Some(FigureArtifacts {
                    page,
                    index,
                    figure: artifact,
                    caption: None,
                });
            }
            ImageRole::Caption(index) => {
                let figure = slots.get_mut(index).and_then(Option::as_mut).ok_or_else(|| {
                    PipelineError::Task(format!("caption {index} has no figure"))
                })?;
                figure.caption = Some(artifact);
            }
            ImageRole::Redacted => redacted_pages.push(RedactedPageArtifact { page, artifact }),
            ImageRole::Page => {
                return Err(PipelineError::Task(format!(
                    "page image {page} produced during figure extraction"
                )))
            }
        }
    }

    let figures = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| PipelineError::Task(format!("figure {index} was not rendered")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExtractResult {
        figures,
        redacted_pages,
    })
}

/// Runs convert and extract requests against an engine and a store
#[derive(Clone)]
pub struct PdfService {
    engine: Arc<dyn PdfEngine>,
    store: ArtifactStore,
    render: RenderConfig,
}

impl std::fmt::Debug for PdfService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfService")
            .field("store", &self.store)
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}

impl PdfService {
    pub fn new(engine: Arc<dyn PdfEngine>, store: ArtifactStore, render: RenderConfig) -> Self {
        Self {
            engine,
            store,
            render,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render
    }

    /// Render every page to a PNG artifact, in page order
    ///
    /// `dpi` overrides the configured render resolution.
    pub async fn convert_to_images(
        &self,
        data: Vec<u8>,
        dpi: Option<f32>,
    ) -> Result<Vec<Artifact>, PipelineError> {
        let dpi = dpi.unwrap_or(self.render.dpi);
        if !dpi.is_finite() || dpi <= 0.0 || dpi > MAX_DPI {
            return Err(PipelineError::InvalidDpi(dpi));
        }
        let scale = dpi / POINTS_PER_INCH;

        let engine = Arc::clone(&self.engine);
        let stored = self
            .run(move |tx| convert::render_pages(engine.as_ref(), &data, scale, tx))
            .await?;

        tracing::info!(pages = stored.len(), dpi, "Converted PDF to images");
        Ok(stored.into_iter().map(|s| s.artifact).collect())
    }

    /// Extract figures and captions and emit redacted page renders
    ///
    /// Every box is validated before anything is rendered: one page index out
    /// of range or one degenerate box fails the whole request and nothing is
    /// written.
    pub async fn extract_figures(
        &self,
        data: Vec<u8>,
        request: ExtractRequest,
    ) -> Result<ExtractResult, PipelineError> {
        let figure_count = request.figures.len();
        let engine = Arc::clone(&self.engine);
        let settings = self.render.clone();

        let stored = self
            .run(move |tx| {
                figures::render_figures(engine.as_ref(), &data, &request, &settings, tx)
            })
            .await?;

        let result = assemble_extract(stored, figure_count)?;
        tracing::info!(
            figures = result.figures.len(),
            redacted_pages = result.redacted_pages.len(),
            "Extracted figures"
        );

        Ok(result)
    }

    /// Run `worker` on the blocking pool and store everything it emits
    async fn run<W>(&self, worker: W) -> Result<Vec<StoredImage>, PipelineError>
    where
        W: FnOnce(&ImageSender) -> Result<(), PipelineError> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(CHANNEL_DEPTH);
        let handle = tokio::task::spawn_blocking(move || worker(&tx));

        let mut batch = self.store.batch();
        let mut stored = Vec::new();
        let mut storage_error = None;

        while let Some(rendered) = rx.recv().await {
            let name = rendered.suggested_name();
            match batch.save(rendered.image, &name).await {
                Ok(artifact) => stored.push(StoredImage {
                    page: rendered.page,
                    role: rendered.role,
                    artifact,
                }),
                Err(e) => {
                    tracing::error!(batch = %batch.id(), name = %name, error = %e, "Aborting request after storage failure");
                    storage_error = Some(e);
                    break;
                }
            }
        }
        drop(rx);

        let outcome = handle
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?;

        if let Some(e) = storage_error {
            return Err(e.into());
        }
        outcome?;
        Ok(stored)
    }
}
