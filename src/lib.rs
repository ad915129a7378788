//! # imgpress
//!
//! Batch image processing: resize, quantize, optimize and convert a list of
//! images in one go, with per-item results streamed as they finish.
//!
//! # Architecture: Plan Once, Fold Per Item
//!
//! A batch is planned up front and then executed item by item:
//!
//! ```text
//! ProcessingConfig ──validate──► StageSpec list   (stages::sequence_stages)
//!                                destination list (naming::plan_output_paths)
//!
//! for each path:  read → decode → fold stages → encode → write  (process::process_item)
//!                 └─► ProcessResult ─► BatchEvent::Progress
//!
//! after the last item:            BatchEvent::Complete
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Isolation**: [`process::process_item`] returns a result value, never an
//!   error, so one corrupt file cannot abort its neighbours.
//! - **Testability**: stage order, dimension math and output naming are pure
//!   functions, and the codecs sit behind [`imaging::ImageBackend`] so the
//!   pipeline runs against a recording mock in unit tests.
//! - **Streaming**: the batch talks to its caller only through a
//!   [`batch::ProgressSink`], typically an `mpsc` channel drained by a printer
//!   thread.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Orchestrator: validation, sequential or pooled execution, cancellation, events |
//! | [`process`] | One item through decode → stages → encode → write |
//! | [`stages`] | Ordered stage list for a config |
//! | [`naming`] | Output path resolution and in-batch collision handling |
//! | [`config`] | `ProcessingConfig`, TOML loading/merging, validation |
//! | [`imaging`] | Codec backend trait, pure dimension math, quality mapping, probing |
//! | [`types`] | Serializable results and events |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Codecs Behind One Trait
//!
//! Decoding and resizing use the `image` crate (Lanczos3), quantization uses
//! `imagequant`, lossless recompression uses `oxipng`, and WebP encoding uses
//! the `webp` crate. All of them are reached through
//! [`imaging::RustBackend`]; nothing above the trait knows which crate does
//! what.
//!
//! ## Optimization Never Grows a File
//!
//! A PNG source that reaches the optimizer unchanged is optimized from its own
//! bytes, and the optimizer's output is discarded if it is not smaller. Running
//! an optimize-only batch twice therefore never increases any file's size.
//!
//! ## Collisions Are Resolved Before Work Starts
//!
//! Destinations for the whole batch are planned together, so two inputs that
//! would produce the same file name get `-2`, `-3`, … suffixes in input order,
//! and parallel workers never race for a path.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod stages;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
