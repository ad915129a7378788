//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use thiserror::Error;

/// A resize request that cannot produce a usable image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid dimension: {0}")]
pub struct InvalidDimension(pub String);

/// Compute the final `(width, height)` of a resize.
///
/// | Targets | Aspect kept | Result |
/// |---|---|---|
/// | none | – | source size |
/// | one | yes | other axis scaled by the same ratio |
/// | one | no | other axis keeps the source value |
/// | both | yes | fit inside the box (smaller ratio wins) |
/// | both | no | exactly the box |
///
/// Upscaling happens whenever the targets ask for it; there is no cap.
///
/// # Errors
///
/// [`InvalidDimension`] when a target is zero, the source has a zero side,
/// or a computed side rounds down to zero.
///
/// # Examples
/// ```
/// # use imgpress::imaging::plan_dimensions;
/// // Width only, aspect kept: 1000x500 → 500x250
/// assert_eq!(plan_dimensions((1000, 500), Some(500), None, true), Ok((500, 250)));
///
/// // Both, aspect kept: 800x600 into 400x400 → 400x300
/// assert_eq!(plan_dimensions((800, 600), Some(400), Some(400), true), Ok((400, 300)));
/// ```
pub fn plan_dimensions(
    source: (u32, u32),
    target_width: Option<u32>,
    target_height: Option<u32>,
    maintain_aspect_ratio: bool,
) -> Result<(u32, u32), InvalidDimension> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return Err(InvalidDimension(format!(
            "source image has zero size ({src_w}x{src_h})"
        )));
    }
    if target_width == Some(0) {
        return Err(InvalidDimension("target width must be positive".into()));
    }
    if target_height == Some(0) {
        return Err(InvalidDimension("target height must be positive".into()));
    }

    let planned = match (target_width, target_height, maintain_aspect_ratio) {
        (None, None, _) => (src_w, src_h),

        (Some(w), None, true) => (w, scale(src_h, w as f64 / src_w as f64)),
        (None, Some(h), true) => (scale(src_w, h as f64 / src_h as f64), h),

        (Some(w), None, false) => (w, src_h),
        (None, Some(h), false) => (src_w, h),

        (Some(w), Some(h), true) => {
            let ratio = (w as f64 / src_w as f64).min(h as f64 / src_h as f64);
            (scale(src_w, ratio), scale(src_h, ratio))
        }
        (Some(w), Some(h), false) => (w, h),
    };

    match planned {
        (0, _) | (_, 0) => Err(InvalidDimension(format!(
            "{src_w}x{src_h} scales to {}x{}",
            planned.0, planned.1
        ))),
        dims => Ok(dims),
    }
}

fn scale(side: u32, ratio: f64) -> u32 {
    (side as f64 * ratio).round() as u32
}

/// Relative size change as a percentage; positive means the output is smaller.
///
/// Returns `0.0` for an empty original so callers never divide by zero.
pub fn size_reduction_percent(original: u64, result: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - result as f64 / original as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // plan_dimensions: single target
    // =========================================================================

    #[test]
    fn width_only_keeps_aspect() {
        assert_eq!(
            plan_dimensions((1000, 500), Some(500), None, true),
            Ok((500, 250))
        );
    }

    #[test]
    fn height_only_keeps_aspect() {
        // 1500x1000, height 400 → width 600
        assert_eq!(
            plan_dimensions((1500, 1000), None, Some(400), true),
            Ok((600, 400))
        );
    }

    #[test]
    fn width_only_without_aspect_keeps_source_height() {
        assert_eq!(
            plan_dimensions((1000, 500), Some(300), None, false),
            Ok((300, 500))
        );
    }

    #[test]
    fn height_only_without_aspect_keeps_source_width() {
        assert_eq!(
            plan_dimensions((1000, 500), None, Some(100), false),
            Ok((1000, 100))
        );
    }

    #[test]
    fn derived_axis_rounds_to_nearest() {
        // 333 * (100/1000) = 33.3 → 33
        assert_eq!(
            plan_dimensions((1000, 333), Some(100), None, true),
            Ok((100, 33))
        );
        // 337 * 0.1 = 33.7 → 34
        assert_eq!(
            plan_dimensions((1000, 337), Some(100), None, true),
            Ok((100, 34))
        );
    }

    // =========================================================================
    // plan_dimensions: both targets
    // =========================================================================

    #[test]
    fn box_with_aspect_is_width_bound() {
        assert_eq!(
            plan_dimensions((800, 600), Some(400), Some(400), true),
            Ok((400, 300))
        );
    }

    #[test]
    fn box_with_aspect_is_height_bound() {
        // 600x800 portrait into 400x400 → 300x400
        assert_eq!(
            plan_dimensions((600, 800), Some(400), Some(400), true),
            Ok((300, 400))
        );
    }

    #[test]
    fn box_without_aspect_stretches() {
        assert_eq!(
            plan_dimensions((800, 600), Some(123), Some(456), false),
            Ok((123, 456))
        );
    }

    #[test]
    fn box_with_aspect_upscales_when_asked() {
        // 100x50 into 1000x1000 → ratio 10 → 1000x500
        assert_eq!(
            plan_dimensions((100, 50), Some(1000), Some(1000), true),
            Ok((1000, 500))
        );
    }

    // =========================================================================
    // plan_dimensions: no-op and failures
    // =========================================================================

    #[test]
    fn no_targets_is_identity() {
        assert_eq!(plan_dimensions((640, 480), None, None, true), Ok((640, 480)));
        assert_eq!(
            plan_dimensions((640, 480), None, None, false),
            Ok((640, 480))
        );
    }

    #[test]
    fn zero_width_is_invalid() {
        assert!(plan_dimensions((640, 480), Some(0), None, true).is_err());
        assert!(plan_dimensions((640, 480), Some(0), Some(100), false).is_err());
    }

    #[test]
    fn zero_height_is_invalid() {
        assert!(plan_dimensions((640, 480), None, Some(0), true).is_err());
    }

    #[test]
    fn degenerate_rounding_is_invalid() {
        // 1000x1 down to width 10 → height 0.01 rounds to 0
        let err = plan_dimensions((1000, 1), Some(10), None, true).unwrap_err();
        assert!(err.0.contains("1000x1"), "unexpected message: {}", err.0);
    }

    #[test]
    fn zero_source_is_invalid() {
        assert!(plan_dimensions((0, 480), Some(100), None, true).is_err());
    }

    // =========================================================================
    // size_reduction_percent
    // =========================================================================

    #[test]
    fn reduction_of_half_is_fifty_percent() {
        assert_eq!(size_reduction_percent(1000, 500), 50.0);
    }

    #[test]
    fn growth_is_negative() {
        assert_eq!(size_reduction_percent(1000, 1500), -50.0);
    }

    #[test]
    fn empty_original_is_zero() {
        assert_eq!(size_reduction_percent(0, 100), 0.0);
    }
}
