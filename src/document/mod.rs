//! PDF engine capability
//!
//! The pipeline never talks to a PDF library directly. It goes through the
//! [`PdfEngine`] / [`PdfDocument`] traits so the engine can be swapped (MuPDF in
//! production, a synthetic engine in tests) and so the decision of how a
//! document handle may be shared stays inside the engine.
//!
//! A [`PdfDocument`] is treated as a single-threaded resource: it is opened,
//! used and dropped on one blocking-pool thread per request.

mod error;
mod traits;

pub use error::{DocumentError, DocumentResult};
pub use traits::{PdfDocument, PdfEngine};

use crate::raster::RasterImage;

/// Render a page, enforcing the rasterizer contract
///
/// `index` must be in `[0, page_count)` and `scale` positive and finite.
pub fn rasterize(doc: &dyn PdfDocument, index: usize, scale: f32) -> DocumentResult<RasterImage> {
    let page_count = doc.page_count();
    if index >= page_count {
        return Err(DocumentError::PageNotFound { index, page_count });
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(DocumentError::InvalidScale(scale));
    }
    doc.render_page(index, scale)
}
