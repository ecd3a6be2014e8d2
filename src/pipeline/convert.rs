//! Whole-document rasterization

use super::{emit, ImageRole, ImageSender, PipelineError, RenderedImage};
use crate::document::{rasterize, PdfEngine};

/// Render every page of `data` in order
pub(crate) fn render_pages(
    engine: &dyn PdfEngine,
    data: &[u8],
    scale: f32,
    tx: &ImageSender,
) -> Result<(), PipelineError> {
    let doc = engine.open(data)?;
    let page_count = doc.page_count();
    tracing::debug!(page_count, scale, "Rendering all pages");

    for page in 0..page_count {
        let image = rasterize(doc.as_ref(), page, scale)?;
        emit(
            tx,
            RenderedImage {
                page,
                role: ImageRole::Page,
                image,
            },
        )?;
    }

    Ok(())
}
