//! Fixture images for the integration tests.
//!
//! Same recipe as the crate's unit-test helpers, so unit and integration
//! tests run on identical pixels.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

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

/// Write a gradient PNG to `path` and return the path.
pub fn write_png(path: &Path, width: u32, height: u32) -> PathBuf {
    gradient_image(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
    path.to_path_buf()
}

/// Write a gradient JPEG to `path` and return the path. JPEG has no alpha, so
/// the gradient is flattened to RGB.
pub fn write_jpeg(path: &Path, width: u32, height: u32) -> PathBuf {
    DynamicImage::ImageRgb8(gradient_image(width, height).to_rgb8())
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
    path.to_path_buf()
}
