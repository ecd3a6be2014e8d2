//! Shared fixtures for integration tests
//!
//! [`SyntheticEngine`] stands in for MuPDF. It "decodes" payloads of the form
//! `%PDF-synthetic pages=N size=WxH` and renders a deterministic pattern that
//! never contains pure black or pure white pixels.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use figura_server::config::Config;
use figura_server::document::{DocumentError, DocumentResult, PdfDocument, PdfEngine};
use figura_server::geometry::PageSize;
use figura_server::raster::RasterImage;
use figura_server::AppState;
use image::{Rgb, RgbImage};

const MAGIC: &str = "%PDF-synthetic";

pub fn synthetic_pdf(pages: usize, width: u32, height: u32) -> Vec<u8> {
    format!("{MAGIC} pages={pages} size={width}x{height}\n").into_bytes()
}

#[derive(Debug, Default)]
pub struct SyntheticEngine;

impl PdfEngine for SyntheticEngine {
    fn open(&self, data: &[u8]) -> DocumentResult<Box<dyn PdfDocument>> {
        let text = std::str::from_utf8(data)
            .map_err(|_| DocumentError::Decode("not utf-8".to_string()))?;
        let rest = text
            .trim()
            .strip_prefix(MAGIC)
            .ok_or_else(|| DocumentError::Decode("missing header".to_string()))?;

        let mut pages = None;
        let mut size = None;
        for token in rest.split_whitespace() {
            if let Some(n) = token.strip_prefix("pages=") {
                pages = n.parse::<usize>().ok();
            } else if let Some(s) = token.strip_prefix("size=") {
                size = s
                    .split_once('x')
                    .and_then(|(w, h)| Some((w.parse::<f32>().ok()?, h.parse::<f32>().ok()?)));
            }
        }

        match (pages, size) {
            (Some(pages), Some((width, height))) => Ok(Box::new(SyntheticDocument {
                pages,
                size: PageSize::new(width, height),
            })),
            _ => Err(DocumentError::Decode("malformed synthetic header".to_string())),
        }
    }
}

struct SyntheticDocument {
    pages: usize,
    size: PageSize,
}

impl PdfDocument for SyntheticDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_size(&self, index: usize) -> DocumentResult<PageSize> {
        if index >= self.pages {
            return Err(DocumentError::PageNotFound {
                index,
                page_count: self.pages,
            });
        }
        Ok(self.size)
    }

    fn render_page(&self, index: usize, scale: f32) -> DocumentResult<RasterImage> {
        let (width, height) = self.page_size(index)?.scaled(scale);
        Ok(RasterImage::from_buffer(RgbImage::from_fn(
            width,
            height,
            |x, y| pattern_pixel(index, x, y),
        )))
    }
}

/// [`SyntheticEngine`] that counts page renders and can slow each one down
#[derive(Debug, Clone, Default)]
pub struct CountingEngine {
    pub renders: Arc<AtomicUsize>,
    pub delay: Duration,
}

impl CountingEngine {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            renders: Arc::default(),
            delay,
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl PdfEngine for CountingEngine {
    fn open(&self, data: &[u8]) -> DocumentResult<Box<dyn PdfDocument>> {
        Ok(Box::new(CountingDocument {
            inner: SyntheticEngine.open(data)?,
            renders: Arc::clone(&self.renders),
            delay: self.delay,
        }))
    }
}

struct CountingDocument {
    inner: Box<dyn PdfDocument>,
    renders: Arc<AtomicUsize>,
    delay: Duration,
}

impl PdfDocument for CountingDocument {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_size(&self, index: usize) -> DocumentResult<PageSize> {
        self.inner.page_size(index)
    }

    fn render_page(&self, index: usize, scale: f32) -> DocumentResult<RasterImage> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.render_page(index, scale)
    }
}

pub fn pattern_pixel(page: usize, x: u32, y: u32) -> Rgb<u8> {
    Rgb([
        (40 + (x * 7 + page as u32 * 31) % 180) as u8,
        (40 + (y * 5) % 180) as u8,
        (40 + ((x + y) * 3) % 180) as u8,
    ])
}

/// Config rooted in `root`, rendering at 72 DPI so pixels equal points
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.storage.root = root.to_path_buf();
    config.storage.url_prefix = "/static".to_string();
    config.retention.root = root.to_path_buf();
    config.render.dpi = 72.0;
    config
}

pub async fn test_state(root: &Path) -> AppState {
    AppState::with_engine(test_config(root), Arc::new(SyntheticEngine))
        .await
        .unwrap()
}

/// Names of every entry in `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn load_png(path: &Path) -> RgbImage {
    image::open(path).unwrap().to_rgb8()
}
