//! Shared test utilities: synthetic images for the real codec backend.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_png(&tmp.path().join("a.png"), 64, 48);
//! let img = gradient_image(64, 48);
//! ```

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// Opaque RGBA gradient with enough distinct colors to exercise quantization.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) * 255 / (width + height).max(1)) as u8;
        Rgba([r, g, b, 255])
    });
    DynamicImage::ImageRgba8(img)
}

/// Encode an image as a plain PNG stream.
pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Fixture files
// =========================================================================

/// Write a gradient PNG to `path`.
pub fn write_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, png_bytes(&gradient_image(width, height))).unwrap();
}

/// Write a gradient JPEG to `path`. JPEG has no alpha, so the gradient is flattened to RGB.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let rgb = DynamicImage::ImageRgb8(gradient_image(width, height).to_rgb8());
    rgb.save_with_format(path, ImageFormat::Jpeg).unwrap();
}
