//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the pipeline and the codec
//! crates. Everything above it (stage folding, batch orchestration) only sees
//! in-memory images and encoded byte streams, so it can be exercised with the
//! recording mock in this module's tests.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a readable image: {0}")]
    Decode(String),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// `Sync` so one backend can be shared by every worker of a batch.
pub trait ImageBackend: Sync {
    /// Read image dimensions from the file header without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an encoded image (PNG, JPEG, WebP, GIF) into pixels.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width` x `height`.
    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError>;

    /// Reduce to a palette and return a paletted PNG stream.
    fn quantize(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;

    /// Losslessly recompress a PNG stream.
    fn optimize(&self, png: &[u8]) -> Result<Vec<u8>, BackendError>;

    /// Encode pixels as a plain PNG stream.
    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>, BackendError>;

    /// Encode pixels as WebP; quality 100 selects lossless.
    fn encode_webp(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
