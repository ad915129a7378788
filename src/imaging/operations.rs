//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{InvalidDimension, plan_dimensions};
use crate::types::ImageInfo;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{}: {}", .path.display(), .source)]
    Unreadable {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Read name, dimensions and file size for every path.
///
/// Header-only: no pixels are decoded. Any failing path fails the whole call.
pub fn probe_images(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
) -> std::result::Result<Vec<ImageInfo>, ProbeError> {
    paths
        .iter()
        .map(|path| {
            let unreadable = |source: BackendError| ProbeError::Unreadable {
                path: path.clone(),
                source,
            };
            let byte_size = std::fs::metadata(path)
                .map_err(|e| unreadable(BackendError::Io(e)))?
                .len();
            let (width, height) = get_dimensions(backend, path).map_err(unreadable)?;

            Ok(ImageInfo {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unknown".to_string()),
                width,
                height,
                byte_size,
                original_path: path.to_string_lossy().into_owned(),
            })
        })
        .collect()
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error(transparent)]
    InvalidDimension(#[from] InvalidDimension),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A resize that has been planned and executed.
#[derive(Debug)]
pub struct Resized {
    pub image: DynamicImage,
    pub from: (u32, u32),
    pub to: (u32, u32),
}

/// Plan the output size from the image's own dimensions and resample to it.
pub fn resize_planned(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    target_width: Option<u32>,
    target_height: Option<u32>,
    maintain_aspect_ratio: bool,
) -> std::result::Result<Resized, ResizeError> {
    let from = (image.width(), image.height());
    let to = plan_dimensions(from, target_width, target_height, maintain_aspect_ratio)?;
    let image = backend.resize(image, to.0, to.1)?;
    Ok(Resized { image, from, to })
}

/// Losslessly recompress a PNG stream, never returning a longer stream than the input.
pub fn optimize_png(backend: &impl ImageBackend, png: Vec<u8>) -> Result<Vec<u8>> {
    let optimized = backend.optimize(&png)?;
    if optimized.len() < png.len() {
        Ok(optimized)
    } else {
        Ok(png)
    }
}
