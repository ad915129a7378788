//! Single-item processing.
//!
//! Runs one source file through read → decode → stages → encode → write and
//! turns every outcome, good or bad, into a [`ProcessResult`]. Nothing past
//! [`process_item`] ever sees an error: the batch stays linear and one bad
//! file cannot take the others down.
//!
//! ## The artifact fold
//!
//! Stages operate on whichever representation the previous stage left:
//!
//! ```text
//! Raster (pixels, + source PNG bytes if unchanged)
//!   ├─ resize    → Raster
//!   ├─ quantize  → Png   (paletted stream)
//!   ├─ optimize  → Png   (never larger than its input)
//!   └─ webp      → written as-is, ends the fold
//! ```
//!
//! A PNG source that reaches `optimize` untouched is optimized from its own
//! bytes, so an optimize-only run never re-encodes and never grows a file.

use crate::config::{OutputFormat, ProcessingConfig};
use crate::imaging::{
    BackendError, ImageBackend, InvalidDimension, Quality, ResizeError, WebpMode, optimize_png,
    resize_planned, size_reduction_percent,
};
use crate::stages::StageSpec;
use crate::types::ProcessResult;
use image::{DynamicImage, ImageFormat};
use log::{debug, warn};
use std::path::Path;
use thiserror::Error;

/// Why a single item failed. Never escapes [`process_item`].
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error(transparent)]
    InvalidDimension(#[from] InvalidDimension),
    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: BackendError,
    },
}

impl ItemError {
    fn stage(stage: &'static str) -> impl FnOnce(BackendError) -> ItemError {
        move |source| match source {
            BackendError::Io(e) => ItemError::Io(e),
            source => ItemError::Stage { stage, source },
        }
    }
}

/// In-memory state threaded through the stage fold.
///
/// WebP conversion is terminal, so there is no WebP variant: its stream goes
/// straight to disk.
enum Artifact {
    /// Decoded pixels. `png` holds the source stream while the pixels are
    /// still exactly what it encodes.
    Raster {
        image: DynamicImage,
        png: Option<Vec<u8>>,
    },
    Png(Vec<u8>),
}

impl Artifact {
    /// Pixels for a stage that needs them, decoding the PNG stream if necessary.
    fn into_image(self, backend: &impl ImageBackend, stage: &'static str) -> Result<DynamicImage, ItemError> {
        match self {
            Artifact::Raster { image, .. } => Ok(image),
            Artifact::Png(bytes) => backend.decode(&bytes).map_err(ItemError::stage(stage)),
        }
    }

    /// A PNG stream for the optimizer, encoding pixels if no stream exists yet.
    fn into_png(self, backend: &impl ImageBackend) -> Result<Vec<u8>, ItemError> {
        match self {
            Artifact::Raster { png: Some(png), .. } | Artifact::Png(png) => Ok(png),
            Artifact::Raster { image, png: None } => {
                backend.encode_png(&image).map_err(ItemError::stage("encode"))
            }
        }
    }
}

/// Outcome of a successful run, before it is flattened into a [`ProcessResult`].
struct Written {
    steps: Vec<String>,
    result_size: u64,
}

/// Process one source into `destination`.
///
/// `original_size` is the source's byte length whenever it could be read.
/// Failures carry `result_size = 0` and an empty `output_path`.
pub fn process_item(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    config: &ProcessingConfig,
    stages: &[StageSpec],
) -> ProcessResult {
    let bytes = match std::fs::read(source) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("{}: cannot read source: {e}", source.display());
            return ProcessResult::failure(0, ItemError::Io(e).to_string());
        }
    };
    let original_size = bytes.len() as u64;

    match run_stages(backend, bytes, destination, config, stages) {
        Ok(Written { steps, result_size }) => {
            let message = format!(
                "{} | {}",
                steps.join(" → "),
                describe_size_change(original_size, result_size)
            );
            debug!("{} → {}: {message}", source.display(), destination.display());
            ProcessResult {
                success: true,
                original_size,
                result_size,
                output_path: destination.to_string_lossy().into_owned(),
                message,
            }
        }
        Err(e) => {
            warn!("{}: {e}", source.display());
            ProcessResult::failure(original_size, e.to_string())
        }
    }
}

fn run_stages(
    backend: &impl ImageBackend,
    bytes: Vec<u8>,
    destination: &Path,
    config: &ProcessingConfig,
    stages: &[StageSpec],
) -> Result<Written, ItemError> {
    let image = backend
        .decode(&bytes)
        .map_err(|e| ItemError::Decode(e.to_string()))?;
    let png = matches!(image::guess_format(&bytes), Ok(ImageFormat::Png)).then_some(bytes);

    let mut artifact = Artifact::Raster { image, png };
    let mut steps = Vec::with_capacity(stages.len());

    for stage in stages {
        artifact = match *stage {
            StageSpec::Resize {
                width,
                height,
                maintain_aspect_ratio,
            } => {
                let image = artifact.into_image(backend, "resize")?;
                let resized = resize_planned(backend, &image, width, height, maintain_aspect_ratio)
                    .map_err(|e| match e {
                        ResizeError::InvalidDimension(e) => ItemError::InvalidDimension(e),
                        ResizeError::Backend(e) => ItemError::stage("resize")(e),
                    })?;
                steps.push(format!(
                    "resize {}x{} → {}x{}",
                    resized.from.0, resized.from.1, resized.to.0, resized.to.1
                ));
                Artifact::Raster {
                    image: resized.image,
                    png: None,
                }
            }
            StageSpec::Quantize(quality) => {
                let image = artifact.into_image(backend, "quantize")?;
                let png = backend
                    .quantize(&image, quality)
                    .map_err(ItemError::stage("quantize"))?;
                steps.push(format!("quantize q{}", quality.value()));
                Artifact::Png(png)
            }
            StageSpec::Optimize => {
                let png = artifact.into_png(backend)?;
                let optimized = optimize_png(backend, png).map_err(ItemError::stage("optimize"))?;
                steps.push("oxipng".to_string());
                Artifact::Png(optimized)
            }
            StageSpec::ConvertWebp(quality) => {
                let image = artifact.into_image(backend, "webp")?;
                let webp = backend
                    .encode_webp(&image, quality)
                    .map_err(ItemError::stage("webp"))?;
                steps.push(webp_step(quality));
                return write_output(destination, &webp, steps);
            }
        };
    }

    let encoded = finalize(backend, artifact, config)?;
    write_output(destination, &encoded, steps)
}

fn write_output(destination: &Path, encoded: &[u8], steps: Vec<String>) -> Result<Written, ItemError> {
    std::fs::write(destination, encoded)?;
    Ok(Written {
        steps,
        result_size: encoded.len() as u64,
    })
}

fn webp_step(quality: Quality) -> String {
    match quality.webp_mode() {
        WebpMode::Lossless => "webp lossless".to_string(),
        WebpMode::Lossy(_) => format!("webp q{}", quality.value()),
    }
}

/// Encode a fold that did not end in a WebP conversion into the configured
/// container. A WebP target reaches this only with a stage list that omits
/// the conversion, in which case the configured quality applies.
fn finalize(
    backend: &impl ImageBackend,
    artifact: Artifact,
    config: &ProcessingConfig,
) -> Result<Vec<u8>, ItemError> {
    match config.output_format {
        OutputFormat::Png => artifact.into_png(backend),
        OutputFormat::Webp => {
            let image = artifact.into_image(backend, "webp")?;
            backend
                .encode_webp(&image, config.quality())
                .map_err(ItemError::stage("webp"))
        }
    }
}

/// `"12000 → 8000 bytes (33.3% smaller)"`
pub fn describe_size_change(original: u64, result: u64) -> String {
    let percent = size_reduction_percent(original, result);
    let change = if result == original {
        "unchanged".to_string()
    } else if percent >= 0.0 {
        format!("{percent:.1}% smaller")
    } else {
        format!("{:.1}% larger", -percent)
    };
    format!("{original} → {result} bytes ({change})")
}
