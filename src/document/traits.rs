//! Engine traits

use super::error::DocumentResult;
use crate::geometry::PageSize;
use crate::raster::RasterImage;

/// Opens PDF payloads
///
/// Engines are shared across requests, so they must be `Send + Sync`. The
/// documents they open are not required to be either.
pub trait PdfEngine: Send + Sync {
    /// Decode a PDF from bytes
    fn open(&self, data: &[u8]) -> DocumentResult<Box<dyn PdfDocument>>;
}

/// An opened document; closed when dropped
pub trait PdfDocument {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Native page size in points
    fn page_size(&self, index: usize) -> DocumentResult<PageSize>;

    /// Render a page to RGB at `scale` (1.0 = 72 DPI)
    ///
    /// Must be deterministic: identical inputs give byte-identical images.
    /// Callers go through [`super::rasterize`], which validates the arguments.
    fn render_page(&self, index: usize, scale: f32) -> DocumentResult<RasterImage>;
}
