//! MuPDF engine adapter
//!
//! Implements [`PdfEngine`] on top of the `mupdf` crate.
//!
//! # Thread Safety
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. A [`MupdfDocument`] is never
//! shared: the pipeline opens it on a blocking-pool thread, renders every page
//! it needs there and drops it before the thread returns. [`MupdfEngine`]
//! itself holds no MuPDF state and is freely shareable.

use mupdf::{Colorspace, Matrix};

use crate::document::{DocumentError, DocumentResult, PdfDocument, PdfEngine};
use crate::geometry::PageSize;
use crate::raster::RasterImage;

const PDF_MIME: &str = "application/pdf";

/// How far into the payload the `%PDF-` marker may appear
const HEADER_SEARCH_LIMIT: usize = 1024;

/// MuPDF-backed engine
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for MupdfEngine {
    fn open(&self, data: &[u8]) -> DocumentResult<Box<dyn PdfDocument>> {
        if !has_pdf_header(data) {
            return Err(DocumentError::Decode("missing %PDF header".to_string()));
        }

        let doc = mupdf::Document::from_bytes(data, PDF_MIME)
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        let page_count = usize::try_from(page_count)
            .map_err(|_| DocumentError::Decode(format!("invalid page count {page_count}")))?;

        tracing::debug!(page_count, bytes = data.len(), "Opened PDF with MuPDF");

        Ok(Box::new(MupdfDocument { doc, page_count }))
    }
}

fn has_pdf_header(data: &[u8]) -> bool {
    let head = &data[..data.len().min(HEADER_SEARCH_LIMIT)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// A document opened by MuPDF
pub struct MupdfDocument {
    doc: mupdf::Document,
    page_count: usize,
}

impl MupdfDocument {
    fn load_page(&self, index: usize) -> DocumentResult<mupdf::Page> {
        if index >= self.page_count {
            return Err(DocumentError::PageNotFound {
                index,
                page_count: self.page_count,
            });
        }
        let page_number = i32::try_from(index).map_err(|_| DocumentError::PageNotFound {
            index,
            page_count: self.page_count,
        })?;
        self.doc.load_page(page_number).map_err(render_error)
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, index: usize) -> DocumentResult<PageSize> {
        let bounds = self.load_page(index)?.bounds().map_err(render_error)?;
        Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn render_page(&self, index: usize, scale: f32) -> DocumentResult<RasterImage> {
        let page = self.load_page(index)?;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(render_error)?;
        pixmap_to_raster(&pixmap)
    }
}

fn render_error(err: mupdf::Error) -> DocumentError {
    DocumentError::Render(err.to_string())
}

/// Copy pixmap samples into an RGB buffer, dropping any extra channels
fn pixmap_to_raster(pixmap: &mupdf::Pixmap) -> DocumentResult<RasterImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(r);
            let b = samples.get(offset + 2).copied().unwrap_or(r);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    RasterImage::from_rgb(width, height, rgb)
        .ok_or_else(|| DocumentError::Render("pixmap size mismatch".to_string()))
}
