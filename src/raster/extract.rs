//! Region extraction

use image::{imageops, Rgb, RgbImage};

use super::RasterImage;
use crate::geometry::PixelRect;

/// Crop `rect` out of a rendered page into a standalone image
///
/// `rect` comes from [`crate::geometry::Rect::to_pixels`], which keeps it
/// non-empty and inside the image.
pub fn extract(page: &RasterImage, rect: PixelRect) -> RasterImage {
    let cropped = imageops::crop_imm(page.as_buffer(), rect.x, rect.y, rect.width, rect.height);
    RasterImage::from_buffer(cropped.to_image())
}

/// Surround an image with a solid border `width` pixels wide
pub fn pad_border(image: &RasterImage, width: u32, color: [u8; 3]) -> RasterImage {
    if width == 0 {
        return image.clone();
    }

    let mut framed = RgbImage::from_pixel(
        image.width() + 2 * width,
        image.height() + 2 * width,
        Rgb(color),
    );
    imageops::replace(&mut framed, image.as_buffer(), i64::from(width), i64::from(width));
    RasterImage::from_buffer(framed)
}
