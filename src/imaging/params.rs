//! Parameter types for image operations.
//!
//! These describe *what* a codec should do, not *how*. They sit between the
//! stage plan (which knows the user's 1–100 quality knob) and the
//! [`backend`](super::backend) (which speaks each codec's native units).
//!
//! ## Types
//!
//! - [`Quality`]: the shared 1–100 quality value. Clamped on construction.
//! - [`QuantizeRange`]: `imagequant` min/max quality derived from [`Quality`].
//! - [`WebpMode`]: lossy WebP at a given quality, or lossless at 100.

/// Shared quality setting (1-100).
///
/// Feeds quantization strength for PNG output and encoding quality for WebP
/// output. The mappings to native codec parameters are [`Quality::quantize_range`]
/// and [`Quality::webp_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality window handed to the quantizer.
    ///
    /// The upper bound is the requested quality; the lower bound sits 10 points
    /// under it so the quantizer may trade a little fidelity for a smaller
    /// palette before giving up.
    pub fn quantize_range(self) -> QuantizeRange {
        QuantizeRange {
            min: self.0.saturating_sub(10) as u8,
            max: self.0 as u8,
        }
    }

    /// WebP encoder mode: 100 means lossless, anything lower is lossy at that quality.
    pub fn webp_mode(self) -> WebpMode {
        if self.0 >= Self::MAX {
            WebpMode::Lossless
        } else {
            WebpMode::Lossy(self.0 as f32)
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Minimum and maximum quality accepted by `imagequant` (0-100 each).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeRange {
    pub min: u8,
    pub max: u8,
}

/// How the WebP encoder is driven.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WebpMode {
    Lossy(f32),
    Lossless,
}
