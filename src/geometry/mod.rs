//! Page geometry and bounding-box mapping
//!
//! Bounding boxes arrive in whatever coordinate space the caller drew them in
//! (usually pixels of a page image rendered at some DPI). Everything downstream
//! works in the page's native space (PDF points, 72 per inch), and only converts
//! to raster pixels with the same scale that was used to render the page.
//!
//! ```text
//!   caller box ──map_box(space)──▶ Rect (points) ──to_pixels(scale)──▶ PixelRect
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// PDF points per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// Native page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Raster dimensions of this page rendered at `scale`
    pub fn scaled(&self, scale: f32) -> (u32, u32) {
        (
            ((self.width * scale).round() as u32).max(1),
            ((self.height * scale).round() as u32).max(1),
        )
    }
}

/// A caller-supplied box: `[left, top, right, bottom]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([left, top, right, bottom]: [f32; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.left, b.top, b.right, b.bottom]
    }
}

/// The coordinate space a bounding box is expressed in
///
/// Serialized as `"points"`, `"normalized"`, `{"dpi": 96}` or
/// `{"pixels": {"width": 816, "height": 1056}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateSpace {
    /// Native PDF points (72 per inch)
    Points,
    /// Pixels of a page image rendered at the given DPI
    Dpi(f32),
    /// Fractions (0-1) of the page width and height
    Normalized,
    /// Pixels of a displayed page image of a known size
    Pixels { width: u32, height: u32 },
}

impl CoordinateSpace {
    /// Per-axis factors that take a coordinate in this space to points
    pub fn scale_factors(&self, page: PageSize) -> Result<(f32, f32), RegionError> {
        match *self {
            CoordinateSpace::Points => Ok((1.0, 1.0)),
            CoordinateSpace::Dpi(dpi) => {
                if !dpi.is_finite() || dpi <= 0.0 {
                    return Err(RegionError::InvalidSpace(format!("dpi must be positive, got {dpi}")));
                }
                let factor = POINTS_PER_INCH / dpi;
                Ok((factor, factor))
            }
            CoordinateSpace::Normalized => Ok((page.width, page.height)),
            CoordinateSpace::Pixels { width, height } => {
                if width == 0 || height == 0 {
                    return Err(RegionError::InvalidSpace(format!(
                        "pixel space must be non-empty, got {width}x{height}"
                    )));
                }
                Ok((page.width / width as f32, page.height / height as f32))
            }
        }
    }
}

/// A rectangle in native page space (points), already clipped to the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Pixel rectangle of this region in an image rendered at `scale`
    ///
    /// The size is `round(w * scale) x round(h * scale)`, never smaller than
    /// 1x1 and never reaching past the image edge.
    pub fn to_pixels(&self, scale: f32, image_width: u32, image_height: u32) -> PixelRect {
        let (x, width) = span_to_pixels(self.x0, self.width(), scale, image_width);
        let (y, height) = span_to_pixels(self.y0, self.height(), scale, image_height);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

impl Rect {
    /// Every pixel this region touches in an image rendered at `scale`
    ///
    /// Rounds outward (`floor` start, `ceil` end), so partially covered pixels
    /// are included. Used for redaction, where no covered pixel may survive.
    pub fn covering_pixels(&self, scale: f32, image_width: u32, image_height: u32) -> PixelRect {
        let (x, width) = span_covering(self.x0, self.x1, scale, image_width);
        let (y, height) = span_covering(self.y0, self.y1, scale, image_height);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

fn span_covering(start: f32, end: f32, scale: f32, limit: u32) -> (u32, u32) {
    let first = ((start * scale).floor().max(0.0) as u32).min(limit.saturating_sub(1));
    let last = ((end * scale).ceil().max(0.0) as u32).min(limit);
    (first, last.saturating_sub(first).max(1))
}

fn span_to_pixels(start: f32, len: f32, scale: f32, limit: u32) -> (u32, u32) {
    let offset = ((start * scale).round() as u32).min(limit.saturating_sub(1));
    let size = ((len * scale).round() as u32)
        .max(1)
        .min(limit.saturating_sub(offset).max(1));
    (offset, size)
}

/// An integer pixel rectangle inside a raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Why a bounding box could not be mapped onto its page
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("box has non-finite coordinates")]
    NonFinite,

    #[error("box is empty after clipping to the page ({width}x{height} points)")]
    Degenerate { width: f32, height: f32 },

    #[error("invalid coordinate space: {0}")]
    InvalidSpace(String),
}

/// Map a caller box into native page space and clip it to the page
pub fn map_box(
    bbox: &BoundingBox,
    page: PageSize,
    space: CoordinateSpace,
) -> Result<Rect, RegionError> {
    if !bbox.is_finite() {
        return Err(RegionError::NonFinite);
    }

    let (sx, sy) = space.scale_factors(page)?;

    let rect = Rect {
        x0: (bbox.left * sx).clamp(0.0, page.width),
        y0: (bbox.top * sy).clamp(0.0, page.height),
        x1: (bbox.right * sx).clamp(0.0, page.width),
        y1: (bbox.bottom * sy).clamp(0.0, page.height),
    };

    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Err(RegionError::Degenerate {
            width: rect.width(),
            height: rect.height(),
        });
    }

    Ok(rect)
}
