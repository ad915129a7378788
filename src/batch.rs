//! Batch orchestration.
//!
//! A batch moves through `Idle → Validating → Running → Completed`:
//!
//! 1. **Validating**: the config's invariants are checked. A rejected batch
//!    goes straight to `Completed` with one synthetic failure, `total = 0`,
//!    no progress events and a single completion event.
//! 2. **Running**: destinations and stages are planned once, then every path
//!    is handed to [`process_item`]. Each finished item is reported as a
//!    [`BatchEvent::Progress`].
//! 3. **Completed**: exactly one [`BatchEvent::Complete`] is emitted and the
//!    [`BatchReport`] is returned, index-aligned with the input paths.
//!
//! Items run sequentially in input order unless `processing.workers` asks for
//! a bounded pool. In that case a dedicated rayon pool runs them, and the
//! completion counter and sink sit behind one lock so `completed` still rises
//! by exactly one per event.
//!
//! [`start_batch`] runs the same thing on a worker thread and hands back a
//! [`BatchHandle`]; [`run_batch`] is the blocking form.

use crate::config::{ProcessingConfig, ValidationError, effective_workers};
use crate::imaging::ImageBackend;
use crate::naming::plan_output_paths;
use crate::process::process_item;
use crate::stages::{StageSpec, sequence_stages};
use crate::types::{BatchEvent, BatchSummary, ProcessResult, ProgressEvent};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use thiserror::Error;

/// Message carried by the result of an item skipped after cancellation.
pub const CANCELLED_MESSAGE: &str = "cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    Running,
    Completed,
}

/// Receiver of batch events.
///
/// Emission never fails from the batch's point of view: a sink that can no
/// longer deliver drops the event.
pub trait ProgressSink {
    fn emit(&mut self, event: BatchEvent);
}

impl ProgressSink for Sender<BatchEvent> {
    fn emit(&mut self, event: BatchEvent) {
        if self.send(event).is_err() {
            debug!("progress receiver dropped, event discarded");
        }
    }
}

/// Collects events in memory.
impl ProgressSink for Vec<BatchEvent> {
    fn emit(&mut self, event: BatchEvent) {
        self.push(event);
    }
}

/// Discards every event.
impl ProgressSink for () {
    fn emit(&mut self, _event: BatchEvent) {}
}

/// Cooperative cancellation flag, checked before each item starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Final outcome of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// One result per input path, in input order. A rejected batch holds a
    /// single synthetic failure instead.
    pub results: Vec<ProcessResult>,
    pub summary: BatchSummary,
    /// Set when the batch never started.
    pub rejection: Option<ValidationError>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.rejection.is_none() && self.results.iter().all(|r| r.success)
    }
}

#[derive(Error, Debug)]
#[error("batch worker thread panicked")]
pub struct WorkerPanicked;

/// A batch running on its own thread.
pub struct BatchHandle {
    state: Arc<Mutex<BatchState>>,
    cancel: CancelToken,
    worker: JoinHandle<BatchReport>,
}

impl BatchHandle {
    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the batch to stop before its next item.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the batch to finish.
    pub fn join(self) -> Result<BatchReport, WorkerPanicked> {
        self.worker.join().map_err(|_| WorkerPanicked)
    }
}

fn set_state(state: &Mutex<BatchState>, next: BatchState) {
    let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
    debug!("batch state {:?} → {:?}", *current, next);
    *current = next;
}

/// Validate `config` and, if accepted, run the batch on a worker thread.
///
/// A rejected config is returned synchronously and emits nothing.
pub fn start_batch<B, S>(
    backend: B,
    paths: Vec<PathBuf>,
    config: ProcessingConfig,
    mut sink: S,
) -> Result<BatchHandle, ValidationError>
where
    B: ImageBackend + Send + 'static,
    S: ProgressSink + Send + 'static,
{
    let state = Arc::new(Mutex::new(BatchState::Idle));
    set_state(&state, BatchState::Validating);
    if let Err(e) = config.validate() {
        warn!("batch rejected: {e}");
        set_state(&state, BatchState::Completed);
        return Err(e);
    }

    let cancel = CancelToken::new();
    let worker = {
        let state = Arc::clone(&state);
        let cancel = cancel.clone();
        std::thread::spawn(move || execute(&backend, &paths, &config, &mut sink, &cancel, &state))
    };

    Ok(BatchHandle {
        state,
        cancel,
        worker,
    })
}

/// Run a batch to completion on the calling thread.
pub fn run_batch<S>(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
    config: &ProcessingConfig,
    sink: &mut S,
    cancel: &CancelToken,
) -> BatchReport
where
    S: ProgressSink + Send,
{
    let state = Mutex::new(BatchState::Idle);
    set_state(&state, BatchState::Validating);

    if let Err(e) = config.validate() {
        warn!("batch rejected: {e}");
        let results = vec![ProcessResult::failure(0, format!("batch rejected: {e}"))];
        let summary = BatchSummary::from_results(0, &results, 0);
        set_state(&state, BatchState::Completed);
        sink.emit(BatchEvent::Complete(summary.clone()));
        return BatchReport {
            results,
            summary,
            rejection: Some(e),
        };
    }

    execute(backend, paths, config, sink, cancel, &state)
}

/// Completion counter and sink, locked together so events leave in counter order.
struct Progress<'a, S> {
    completed: usize,
    sink: &'a mut S,
}

/// Everything one item needs, shared read-only by every worker.
struct Plan<'a, B> {
    backend: &'a B,
    paths: &'a [PathBuf],
    destinations: Vec<PathBuf>,
    stages: Vec<StageSpec>,
    config: &'a ProcessingConfig,
    cancel: &'a CancelToken,
}

/// Run an already validated batch.
fn execute<B, S>(
    backend: &B,
    paths: &[PathBuf],
    config: &ProcessingConfig,
    sink: &mut S,
    cancel: &CancelToken,
    state: &Mutex<BatchState>,
) -> BatchReport
where
    B: ImageBackend,
    S: ProgressSink + Send,
{
    let total = paths.len();
    let plan = Plan {
        backend,
        paths,
        destinations: plan_output_paths(paths, config),
        stages: sequence_stages(config),
        config,
        cancel,
    };
    info!(
        "processing {total} image(s): {} → {}",
        describe_stages(&plan.stages),
        config.output_format
    );
    set_state(state, BatchState::Running);

    let progress = Mutex::new(Progress { completed: 0, sink });
    let cancelled = AtomicUsize::new(0);

    let run_one = |index: usize| -> ProcessResult {
        if plan.cancel.is_cancelled() {
            cancelled.fetch_add(1, Ordering::Relaxed);
            return ProcessResult::failure(0, CANCELLED_MESSAGE);
        }
        let source = &plan.paths[index];
        let result = process_item(
            plan.backend,
            source,
            &plan.destinations[index],
            plan.config,
            &plan.stages,
        );

        let mut progress = progress.lock().unwrap_or_else(PoisonError::into_inner);
        progress.completed += 1;
        let event = ProgressEvent {
            completed: progress.completed,
            total,
            current_file: Some(source.to_string_lossy().into_owned()),
            result: Some(result.clone()),
        };
        progress.sink.emit(BatchEvent::Progress(event));
        result
    };

    let results: Vec<ProcessResult> = match effective_workers(&config.processing) {
        Some(workers) => match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => {
                debug!("running on a pool of {workers} worker(s)");
                pool.install(|| (0..total).into_par_iter().map(&run_one).collect())
            }
            Err(e) => {
                warn!("cannot start worker pool ({e}), processing sequentially");
                (0..total).map(&run_one).collect()
            }
        },
        None => (0..total).map(&run_one).collect(),
    };

    let cancelled = cancelled.into_inner();
    let summary = BatchSummary::from_results(total, &results, cancelled);
    if cancelled > 0 {
        info!("batch cancelled, {cancelled} item(s) skipped");
    }
    info!(
        "batch complete: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );

    set_state(state, BatchState::Completed);
    let progress = progress.into_inner().unwrap_or_else(PoisonError::into_inner);
    progress.sink.emit(BatchEvent::Complete(summary.clone()));

    BatchReport {
        results,
        summary,
        rejection: None,
    }
}

fn describe_stages(stages: &[StageSpec]) -> String {
    if stages.is_empty() {
        return "re-encode".to_string();
    }
    stages
        .iter()
        .map(StageSpec::name)
        .collect::<Vec<_>>()
        .join(" → ")
}
