//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each item leads with its position in the batch and its file name; paths
//! and the processing outcome follow as indented context lines. Failures
//! read the same way, with a `Failed:` line in place of the outcome.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! 001/003 dawn.png
//!     Source: photos/dawn.png
//!     Output: out/dawn_processed.png
//!     resize 4000x3000 → 1200x900 → oxipng | 5210344 → 801233 bytes (84.6% smaller)
//! 002/003 broken.png
//!     Source: photos/broken.png
//!     Failed: decode failed: not a readable image: ...
//!
//! Processed 3 images: 2 succeeded, 1 failed
//!     Total: 5400000 → 900000 bytes (83.3% smaller)
//! ```
//!
//! ## Probe
//!
//! ```text
//! 001 dawn.png
//!     Source: photos/dawn.png
//!     4000x3000, 5210344 bytes
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::process::describe_size_change;
use crate::types::{BatchEvent, BatchSummary, ImageInfo, ProgressEvent};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format one progress event.
///
/// ```text
/// 002/010 cat.jpg
///     Source: in/cat.jpg
///     Output: in/cat_processed.png
///     quantize q80 | 30000 → 9000 bytes (70.0% smaller)
/// ```
pub fn format_progress_event(event: &ProgressEvent) -> Vec<String> {
    let source = event.current_file.as_deref().unwrap_or("");
    let mut lines = vec![format!(
        "{}/{} {}",
        format_index(event.completed),
        format_index(event.total),
        file_name(source)
    )];
    if !source.is_empty() {
        lines.push(format!("{}Source: {}", indent(1), source));
    }

    if let Some(result) = &event.result {
        if result.success {
            lines.push(format!("{}Output: {}", indent(1), result.output_path));
            lines.push(format!("{}{}", indent(1), result.message));
        } else {
            lines.push(format!("{}Failed: {}", indent(1), result.message));
        }
    }
    lines
}

/// Format the closing summary of a batch.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let mut headline = format!(
        "Processed {}: {} succeeded, {} failed",
        plural(summary.total, "image"),
        summary.succeeded,
        summary.failed
    );
    if summary.cancelled > 0 {
        headline.push_str(&format!(" ({} cancelled)", summary.cancelled));
    }

    let mut lines = vec![headline];
    if summary.succeeded > 0 {
        lines.push(format!(
            "{}Total: {}",
            indent(1),
            describe_size_change(summary.original_bytes, summary.result_bytes)
        ));
    }
    lines
}

/// Format any batch event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Progress(progress) => format_progress_event(progress),
        BatchEvent::Complete(summary) => {
            let mut lines = vec![String::new()];
            lines.extend(format_summary(summary));
            lines
        }
    }
}

/// Print a batch event to stdout.
pub fn print_batch_event(event: &BatchEvent) {
    for line in format_batch_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Probe output
// ============================================================================

/// Format probed image metadata, one entry per image.
pub fn format_image_info(infos: &[ImageInfo]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, info) in infos.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), info.name));
        lines.push(format!("{}Source: {}", indent(1), info.original_path));
        lines.push(format!(
            "{}{}x{}, {} bytes",
            indent(1),
            info.width,
            info.height,
            info.byte_size
        ));
    }
    lines
}

/// Print probed image metadata to stdout.
pub fn print_image_info(infos: &[ImageInfo]) {
    for line in format_image_info(infos) {
        println!("{}", line);
    }
}
