//! Redaction by solid overpaint

use super::{FillColor, RasterImage};
use crate::geometry::PixelRect;

/// Return a copy of `page` with every rectangle filled with `fill`
///
/// The source image is left untouched. Overlapping rectangles simply paint the
/// same pixels twice with the same color.
pub fn redact(page: &RasterImage, rects: &[PixelRect], fill: FillColor) -> RasterImage {
    let mut buffer = page.as_buffer().clone();
    let (width, height) = buffer.dimensions();
    let color = fill.rgb();

    for rect in rects {
        let x_end = rect.x.saturating_add(rect.width).min(width);
        let y_end = rect.y.saturating_add(rect.height).min(height);
        for y in rect.y.min(y_end)..y_end {
            for x in rect.x.min(x_end)..x_end {
                buffer.put_pixel(x, y, color);
            }
        }
    }

    RasterImage::from_buffer(buffer)
}
