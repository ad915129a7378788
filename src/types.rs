//! Shared types streamed to the caller.
//!
//! Everything here is `Serialize` so a front end can forward events verbatim
//! (the CLI's `--json` mode prints them one per line).

use serde::{Deserialize, Serialize};

/// Metadata of a source image, read without decoding pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// File name including extension.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// File size in bytes.
    pub byte_size: u64,
    pub original_path: String,
}

/// Outcome of processing one input.
///
/// Failures carry `result_size = 0` and an empty `output_path`; `message`
/// names the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub success: bool,
    pub original_size: u64,
    pub result_size: u64,
    pub output_path: String,
    pub message: String,
}

impl ProcessResult {
    pub fn failure(original_size: u64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            original_size,
            result_size: 0,
            output_path: String::new(),
            message: message.into(),
        }
    }
}

/// Per-item progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Number of finished items, 1-based and strictly increasing within a batch.
    pub completed: usize,
    pub total: usize,
    pub current_file: Option<String>,
    pub result: Option<ProcessResult>,
}

/// Aggregate figures sent with the completion signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Inputs skipped because the batch was cancelled (counted in `failed` too).
    pub cancelled: usize,
    /// Bytes read from inputs that were written successfully.
    pub original_bytes: u64,
    /// Bytes written for those same inputs.
    pub result_bytes: u64,
}

impl BatchSummary {
    /// Tally a result list. `total` is the number of inputs the batch accepted.
    pub fn from_results(total: usize, results: &[ProcessResult], cancelled: usize) -> Self {
        let mut summary = Self {
            total,
            cancelled,
            ..Self::default()
        };
        for r in results {
            if r.success {
                summary.succeeded += 1;
                summary.original_bytes += r.original_size;
                summary.result_bytes += r.result_size;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }
}

/// Everything a batch emits, in emission order.
///
/// Zero or more `Progress` events, then exactly one `Complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Progress(ProgressEvent),
    Complete(BatchSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(original: u64, result: u64) -> ProcessResult {
        ProcessResult {
            success: true,
            original_size: original,
            result_size: result,
            output_path: "out.png".into(),
            message: "done".into(),
        }
    }

    #[test]
    fn failure_has_no_output() {
        let r = ProcessResult::failure(42, "boom");
        assert!(!r.success);
        assert_eq!(r.original_size, 42);
        assert_eq!(r.result_size, 0);
        assert!(r.output_path.is_empty());
        assert_eq!(r.message, "boom");
    }

    #[test]
    fn summary_counts_only_successful_bytes() {
        let results = vec![ok(100, 40), ProcessResult::failure(500, "x"), ok(50, 50)];
        let summary = BatchSummary::from_results(3, &results, 0);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.original_bytes, 150);
        assert_eq!(summary.result_bytes, 90);
    }

    #[test]
    fn progress_event_serializes_tagged() {
        let event = BatchEvent::Progress(ProgressEvent {
            completed: 1,
            total: 2,
            current_file: Some("a.png".into()),
            result: Some(ok(10, 5)),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["completed"], 1);
        assert_eq!(json["result"]["result_size"], 5);
    }

    #[test]
    fn complete_event_has_no_result() {
        let json = serde_json::to_value(BatchEvent::Complete(BatchSummary::default())).unwrap();
        assert_eq!(json["event"], "complete");
        assert!(json.get("result").is_none());
    }
}
