//! Raster images and the pixel operations run on them
//!
//! - [`extract`]: crop a region out of a rendered page
//! - [`redact`]: overpaint regions of a rendered page with a solid fill
//! - [`pad_border`]: frame an extracted figure

mod extract;
mod redact;

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, Rgb, RgbImage};

pub use extract::{extract, pad_border};
pub use redact::redact;

/// An RGB8 pixel buffer produced from a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    buffer: RgbImage,
}

impl RasterImage {
    /// Wrap raw RGB samples (`width * height * 3` bytes)
    pub fn from_rgb(width: u32, height: u32, samples: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, samples).map(Self::from_buffer)
    }

    pub fn from_buffer(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn as_buffer(&self) -> &RgbImage {
        &self.buffer
    }

    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn into_buffer(self) -> RgbImage {
        self.buffer
    }

    /// Encode as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut output = Vec::new();
        DynamicImage::ImageRgb8(self.buffer.clone())
            .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;
        Ok(output)
    }
}

/// Solid color used to overpaint redacted regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillColor(pub [u8; 3]);

impl FillColor {
    pub const BLACK: FillColor = FillColor([0, 0, 0]);
    pub const WHITE: FillColor = FillColor([255, 255, 255]);

    pub(crate) fn rgb(self) -> Rgb<u8> {
        Rgb(self.0)
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct ParseColorError(String);

impl FromStr for FillColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(FillColor([channel(0)?, channel(2)?, channel(4)?]))
    }
}
