//! Stage sequencing.
//!
//! The ordered list of stages for a config is computed once per batch and
//! folded over each item. Order is fixed per output format:
//!
//! ```text
//! png:  [Resize] → [Quantize] → [Optimize]
//! webp: [Resize] → ConvertWebp
//! ```
//!
//! Bracketed stages are present only when enabled; they are never reordered.

use crate::config::{OutputFormat, ProcessingConfig};
use crate::imaging::Quality;

/// One transformation applied to an in-memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSpec {
    Resize {
        width: Option<u32>,
        height: Option<u32>,
        maintain_aspect_ratio: bool,
    },
    Quantize(Quality),
    Optimize,
    ConvertWebp(Quality),
}

impl StageSpec {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            StageSpec::Resize { .. } => "resize",
            StageSpec::Quantize(_) => "quantize",
            StageSpec::Optimize => "optimize",
            StageSpec::ConvertWebp(_) => "webp",
        }
    }
}

/// Stages to run for `config`, in execution order. Pure and infallible.
pub fn sequence_stages(config: &ProcessingConfig) -> Vec<StageSpec> {
    let mut stages = Vec::with_capacity(3);

    if let Some(resize) = &config.resize {
        stages.push(StageSpec::Resize {
            width: resize.width,
            height: resize.height,
            maintain_aspect_ratio: resize.maintain_aspect_ratio,
        });
    }

    match config.output_format {
        OutputFormat::Png => {
            if config.quantize.is_some() {
                stages.push(StageSpec::Quantize(config.quantize_quality()));
            }
            if config.optimize {
                stages.push(StageSpec::Optimize);
            }
        }
        OutputFormat::Webp => stages.push(StageSpec::ConvertWebp(config.quality())),
    }

    stages
}
