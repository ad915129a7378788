//! Pure Rust codec backend (libimagequant and libwebp are bundled by their crates).
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (PNG, JPEG, WebP, GIF) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Quantize | `imagequant` (dithering 1.0) → paletted PNG via `lodepng` |
//! | Optimize | `oxipng::optimize_from_memory`, preset 4 + libdeflate 12 |
//! | Encode → PNG | `image` PNG encoder |
//! | Encode → WebP | `webp::Encoder` lossy, or lossless at quality 100 |
//!
//! Decoding goes through the `image` crate's default limits, so a file that
//! claims absurd dimensions fails as a decode error instead of allocating.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Quality, WebpMode};
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True when the path's extension names a decodable format (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Production backend.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    optimize_preset: u8,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { optimize_preset: 4 }
    }

    fn oxipng_options(&self) -> oxipng::Options {
        let mut options = oxipng::Options::from_preset(self.optimize_preset);
        options.deflater = oxipng::Deflater::Libdeflater { compression: 12 };
        options.strip = oxipng::StripChunks::Safe;
        options.optimize_alpha = true;
        options.fast_evaluation = true;
        options
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(e: ImageError) -> BackendError {
    match e {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Decode(other.to_string()),
    }
}

fn quantize_error(step: &str, e: imagequant::Error) -> BackendError {
    BackendError::ProcessingFailed(format!("imagequant {step}: {e}"))
}

/// Write 8-bit palette indices as a paletted PNG.
fn encode_paletted_png(
    palette: &[imagequant::RGBA],
    indices: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, BackendError> {
    let palette_error = |e: lodepng::Error| BackendError::Encode(format!("PNG palette: {e}"));

    let mut encoder = lodepng::Encoder::new();
    for c in palette {
        let color = lodepng::RGBA {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        };
        encoder
            .info_raw_mut()
            .palette_add(color)
            .map_err(palette_error)?;
        encoder
            .info_png_mut()
            .color
            .palette_add(color)
            .map_err(palette_error)?;
    }

    encoder.info_raw_mut().colortype = lodepng::ColorType::PALETTE;
    encoder.info_raw_mut().set_bitdepth(8);
    encoder.info_png_mut().color.colortype = lodepng::ColorType::PALETTE;
    encoder.info_png_mut().color.set_bitdepth(8);

    encoder
        .encode(indices, width as usize, height as usize)
        .map_err(|e| BackendError::Encode(format!("paletted PNG: {e}")))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(decode_error)?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        // Reading from memory cannot fail for IO reasons; an EOF here means a truncated file.
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if image.width() == width && image.height() == height {
            return Ok(image.clone());
        }
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn quantize(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels: Vec<imagequant::RGBA> = rgba
            .pixels()
            .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], p[3]))
            .collect();

        let range = quality.quantize_range();
        let mut attrs = imagequant::new();
        attrs
            .set_quality(range.min, range.max)
            .map_err(|e| quantize_error("quality", e))?;

        let mut liq_image = attrs
            .new_image(pixels, width as usize, height as usize, 0.0)
            .map_err(|e| quantize_error("image", e))?;
        let mut quantized = attrs
            .quantize(&mut liq_image)
            .map_err(|e| quantize_error("quantize", e))?;
        quantized
            .set_dithering_level(1.0)
            .map_err(|e| quantize_error("dithering", e))?;
        let (palette, indices) = quantized
            .remapped(&mut liq_image)
            .map_err(|e| quantize_error("remap", e))?;

        encode_paletted_png(&palette, &indices, width, height)
    }

    fn optimize(&self, png: &[u8]) -> Result<Vec<u8>, BackendError> {
        oxipng::optimize_from_memory(png, &self.oxipng_options())
            .map_err(|e| BackendError::ProcessingFailed(format!("oxipng: {e}")))
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>, BackendError> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| BackendError::Encode(format!("PNG: {e}")))?;
        Ok(buf.into_inner())
    }

    fn encode_webp(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let rgba = image.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
        let memory = match quality.webp_mode() {
            WebpMode::Lossless => encoder.encode_simple(true, 100.0),
            WebpMode::Lossy(q) => encoder.encode_simple(false, q),
        }
        .map_err(|e| BackendError::Encode(format!("WebP: {e:?}")))?;
        Ok(memory.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_image, png_bytes, write_jpeg, write_png};
    use image::GenericImageView;

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["png", "jpg", "jpeg", "webp", "gif"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn supported_input_ignores_case() {
        assert!(is_supported_input(Path::new("/a/B.PNG")));
        assert!(is_supported_input(Path::new("photo.JpEg")));
        assert!(!is_supported_input(Path::new("notes.txt")));
        assert!(!is_supported_input(Path::new("no_extension")));
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_truncated_png_is_decode_error() {
        let png = png_bytes(&gradient_image(16, 16));
        let result = RustBackend::new().decode(&png[..png.len() / 2]);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_png_roundtrip_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.png");
        write_png(&path, 64, 48);

        let img = RustBackend::new()
            .decode(&std::fs::read(&path).unwrap())
            .unwrap();
        assert_eq!(img.dimensions(), (64, 48));
    }

    #[test]
    fn resize_produces_requested_dimensions() {
        let resized = RustBackend::new()
            .resize(&gradient_image(120, 80), 60, 20)
            .unwrap();
        assert_eq!(resized.dimensions(), (60, 20));
    }

    #[test]
    fn quantize_produces_paletted_png() {
        let backend = RustBackend::new();
        let png = backend
            .quantize(&gradient_image(64, 64), Quality::new(80))
            .unwrap();

        assert_eq!(
            image::guess_format(&png).unwrap(),
            ImageFormat::Png,
            "quantized output must be a PNG stream"
        );
        // Color type byte of the IHDR chunk: 3 = indexed
        assert_eq!(png[25], 3);
        assert_eq!(backend.decode(&png).unwrap().dimensions(), (64, 64));
    }

    #[test]
    fn optimize_keeps_pixels() {
        let backend = RustBackend::new();
        let source = gradient_image(48, 32);
        let optimized = backend.optimize(&png_bytes(&source)).unwrap();

        let decoded = backend.decode(&optimized).unwrap();
        assert_eq!(decoded.to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn optimize_rejects_non_png() {
        let result = RustBackend::new().optimize(b"not a png");
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn encode_png_is_lossless() {
        let backend = RustBackend::new();
        let source = gradient_image(30, 20);
        let png = backend.encode_png(&source).unwrap();
        assert_eq!(backend.decode(&png).unwrap().to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn encode_webp_lossy_decodes() {
        let backend = RustBackend::new();
        let webp = backend
            .encode_webp(&gradient_image(40, 30), Quality::new(75))
            .unwrap();
        assert_eq!(image::guess_format(&webp).unwrap(), ImageFormat::WebP);
        assert_eq!(backend.decode(&webp).unwrap().dimensions(), (40, 30));
    }

    #[test]
    fn encode_webp_at_100_is_lossless() {
        let backend = RustBackend::new();
        let source = gradient_image(40, 30);
        let webp = backend.encode_webp(&source, Quality::new(100)).unwrap();
        assert_eq!(backend.decode(&webp).unwrap().to_rgba8(), source.to_rgba8());
    }
}
