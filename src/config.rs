//! Processing configuration.
//!
//! One [`ProcessingConfig`] drives one batch. It can be built in code, or
//! loaded from a TOML file that is merged over the stock defaults so the file
//! only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! optimize = false          # Lossless PNG recompression (oxipng)
//! output_format = "png"     # "png" or "webp"
//! quality = 80              # 1-100; quantization strength / WebP quality
//! suffix = "_processed"     # Appended to every output file stem
//! # output_dir = "out"      # Omit to write next to each source
//!
//! [resize]                  # Omit the table to skip resizing
//! width = 1200
//! height = 800
//! maintain_aspect_ratio = true
//!
//! [quantize]                # Omit the table to skip quantization
//! quality = 70              # Defaults to the shared quality
//!
//! [processing]
//! workers = 4               # Omit for sequential processing
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Reasons a batch is rejected before any item is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("PNG output needs at least one of resize, quantize or optimize")]
    NoStages,
    #[error("{field} must be {min}-{max}, got {value}", min = Quality::MIN, max = Quality::MAX)]
    QualityOutOfRange { field: &'static str, value: u32 },
}

/// Output container written for every item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown output format {0:?} (expected png or webp)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Target box for the resize stage.
///
/// An absent axis is derived (aspect kept) or left at the source value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect_ratio: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuantizeOptions {
    /// Overrides the shared quality for the quantizer only.
    pub quality: Option<u32>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Number of items processed at once.
    /// When absent, items run one after another in input order.
    /// Values larger than the core count are clamped down.
    pub workers: Option<usize>,
}

/// Everything a batch needs to know about what to do with each image.
///
/// Scalar keys come before tables so the value serializes as valid TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Lossless PNG recompression.
    pub optimize: bool,
    /// Destination directory. Absent means next to each source file.
    pub output_dir: Option<PathBuf>,
    pub output_format: OutputFormat,
    /// Shared 1-100 quality.
    pub quality: u32,
    /// Appended to every output file stem.
    pub suffix: String,
    pub resize: Option<ResizeOptions>,
    pub quantize: Option<QuantizeOptions>,
    pub processing: WorkerConfig,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            optimize: false,
            output_dir: None,
            output_format: OutputFormat::Png,
            quality: Quality::default().value(),
            suffix: "_processed".to_string(),
            resize: None,
            quantize: None,
            processing: WorkerConfig::default(),
        }
    }
}

impl ProcessingConfig {
    /// Check the batch-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_quality("quality", self.quality)?;
        if let Some(q) = self.quantize.as_ref().and_then(|q| q.quality) {
            check_quality("quantize.quality", q)?;
        }
        if self.output_format == OutputFormat::Png
            && self.resize.is_none()
            && self.quantize.is_none()
            && !self.optimize
        {
            return Err(ValidationError::NoStages);
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    /// Quality handed to the quantizer: its own setting, else the shared one.
    pub fn quantize_quality(&self) -> Quality {
        self.quantize
            .as_ref()
            .and_then(|q| q.quality)
            .map(Quality::new)
            .unwrap_or_else(|| self.quality())
    }
}

fn check_quality(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if (Quality::MIN..=Quality::MAX).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::QualityOutOfRange { field, value })
    }
}

/// Resolve the worker count from config.
///
/// - `None` → sequential processing
/// - `Some(n)` → `min(n, cores)`, at least 1 (user can constrain down, not up)
pub fn effective_workers(config: &WorkerConfig) -> Option<usize> {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.workers.map(|n| n.clamp(1, cores))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ProcessingConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize.
///
/// Range checks run here; the "PNG needs a stage" rule is left to the batch,
/// since CLI flags may still enable a stage.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ProcessingConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProcessingConfig = merged.try_into()?;
    check_quality("quality", config.quality)?;
    if let Some(q) = config.quantize.as_ref().and_then(|q| q.quality) {
        check_quality("quantize.quality", q)?;
    }
    Ok(config)
}

/// Load the stock config, with the file at `path` merged on top when given.
pub fn load_config(path: Option<&Path>) -> Result<ProcessingConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgpress Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass the file with `imgpress process --config imgpress.toml ...`.
# Command-line flags override values from the file.
# Unknown keys will cause an error.

# Lossless PNG recompression (oxipng). Never makes a file larger.
optimize = false

# Output container: "png" or "webp".
output_format = "png"

# Shared quality, 1-100.
# PNG: upper bound of the quantizer's quality window.
# WebP: encoder quality; 100 switches to lossless WebP.
quality = 80

# Appended to every output file stem: photo.jpg -> photo_processed.png
# Set to "" to keep the stem unchanged.
suffix = "_processed"

# Destination directory. Omit to write next to each source file.
# The directory must exist.
# output_dir = "processed"

# ---------------------------------------------------------------------------
# Resize (omit the whole table to keep source dimensions)
# ---------------------------------------------------------------------------
# [resize]
# width = 1200
# height = 800
# With aspect kept, both axes given means "fit inside the box".
# Without it, the image is stretched to exactly width x height.
# maintain_aspect_ratio = true

# ---------------------------------------------------------------------------
# Quantize (PNG only; omit the whole table to skip)
# ---------------------------------------------------------------------------
# [quantize]
# Defaults to the shared quality above.
# quality = 70

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Number of images processed at once (clamped to the CPU core count).
# Omit or comment out to process one image at a time, in input order.
# workers = 4
"##
}
