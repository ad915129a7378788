//! Image codecs and dimension math.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | Lanczos3 via `image::imageops` |
//! | **Quantize** | `imagequant` + `lodepng` (paletted PNG) |
//! | **Optimize** | `oxipng` |
//! | **WebP** | `webp` (lossy / lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality value and its per-codec mappings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{InvalidDimension, plan_dimensions, size_reduction_percent};
pub use operations::{
    ProbeError, ResizeError, Resized, get_dimensions, optimize_png, probe_images, resize_planned,
};
pub use params::{Quality, QuantizeRange, WebpMode};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
