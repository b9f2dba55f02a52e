//! Fixed-size worker pool running the frame statistics producer
//!
//! Workers pull frame indices from a bounded job channel and send back
//! `(frame, outcome)` pairs. Nothing is shared between workers except the
//! read-only frame list and producer; results are slotted by frame index on
//! the calling thread, so completion order does not matter.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{bounded, unbounded};

use crate::error::{ConsolidationError, Result};
use crate::frame::{FrameAssignment, FrameStats};

/// Computes the statistics of every tracked cell in one frame.
///
/// Returning `Ok(None)` means the frame has no tracked cells. Errors and
/// panics are contained to the frame that raised them.
pub trait FrameStatsProducer: Sync {
    fn produce(&self, frame: &FrameAssignment) -> anyhow::Result<Option<FrameStats>>;

    /// Name used in log messages
    fn name(&self) -> &str {
        "frame-stats"
    }
}

impl<F> FrameStatsProducer for F
where
    F: Fn(&FrameAssignment) -> anyhow::Result<Option<FrameStats>> + Sync,
{
    fn produce(&self, frame: &FrameAssignment) -> anyhow::Result<Option<FrameStats>> {
        self(frame)
    }
}

/// Shared flag to abandon a dispatch in progress
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
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

/// Frame-indexed results of one dispatch
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// `results[f]` is `None` when frame `f` had no cells or failed
    pub results: Vec<Option<FrameStats>>,
    /// Frames whose producer call failed, ascending
    pub failed_frames: Vec<usize>,
    pub empty_frames: usize,
}

impl DispatchOutcome {
    pub fn produced_frames(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    /// Frames whose producer call returned, successfully or not
    pub fn completed_frames(&self) -> usize {
        self.produced_frames() + self.empty_frames + self.failed_frames.len()
    }
}

enum FrameOutcome {
    Stats(FrameStats),
    Empty,
    Failed(String),
}

/// Runs a [`FrameStatsProducer`] once per frame on `num_workers` threads
#[derive(Debug, Clone)]
pub struct ParallelStatsDispatcher {
    num_workers: usize,
}

impl ParallelStatsDispatcher {
    pub fn new(num_workers: usize) -> Result<Self> {
        if num_workers == 0 {
            return Err(ConsolidationError::config(
                "worker pool needs at least one worker",
            ));
        }
        Ok(Self { num_workers })
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Run the producer on every frame and block until all results are in
    pub fn dispatch<P: FrameStatsProducer>(
        &self,
        frames: &[FrameAssignment],
        producer: &P,
    ) -> DispatchOutcome {
        let start = Instant::now();
        let outcome = self.run(frames, producer, &CancelFlag::new());
        log_summary(&outcome, start);
        outcome
    }

    /// Like [`dispatch`](Self::dispatch), but gives up as soon as `cancel` is
    /// raised. In-flight results are discarded.
    pub fn dispatch_with_cancel<P: FrameStatsProducer>(
        &self,
        frames: &[FrameAssignment],
        producer: &P,
        cancel: &CancelFlag,
    ) -> Result<DispatchOutcome> {
        let start = Instant::now();
        let outcome = self.run(frames, producer, cancel);
        if cancel.is_cancelled() {
            let (completed, total) = (outcome.completed_frames(), frames.len());
            log::warn!("Dispatch cancelled after {} of {} frames", completed, total);
            return Err(ConsolidationError::Cancelled { completed, total });
        }
        log_summary(&outcome, start);
        Ok(outcome)
    }

    fn run<P: FrameStatsProducer>(
        &self,
        frames: &[FrameAssignment],
        producer: &P,
        cancel: &CancelFlag,
    ) -> DispatchOutcome {
        let total = frames.len();
        let mut outcome = DispatchOutcome {
            results: (0..total).map(|_| None).collect(),
            ..Default::default()
        };

        let (job_tx, job_rx) = bounded::<usize>(self.num_workers * 2);
        let (result_tx, result_rx) = unbounded::<(usize, FrameOutcome)>();

        thread::scope(|scope| {
            for worker_id in 0..self.num_workers.min(total) {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();

                scope.spawn(move || {
                    log::debug!("Stats worker {} started", worker_id);

                    while let Ok(index) = job_rx.recv() {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let result = run_producer(producer, &frames[index]);
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                    }

                    log::debug!("Stats worker {} stopped", worker_id);
                });
            }
            drop(job_rx);
            drop(result_tx);

            for index in 0..total {
                if cancel.is_cancelled() || job_tx.send(index).is_err() {
                    break;
                }
            }
            drop(job_tx);

            for (index, result) in result_rx.iter() {
                match result {
                    FrameOutcome::Stats(mut stats) => {
                        stats.frame = index;
                        outcome.results[index] = Some(stats);
                    }
                    FrameOutcome::Empty => outcome.empty_frames += 1,
                    FrameOutcome::Failed(reason) => {
                        log::warn!(
                            "{} failed on frame {} ({}): {}",
                            producer.name(),
                            index,
                            frames[index].source_file,
                            reason
                        );
                        outcome.failed_frames.push(index);
                    }
                }
            }
        });

        outcome.failed_frames.sort_unstable();
        outcome
    }
}

fn log_summary(outcome: &DispatchOutcome, start: Instant) {
    log::info!(
        "Computed statistics for {} frames in {:.1}s ({} empty, {} failed)",
        outcome.results.len(),
        start.elapsed().as_secs_f32(),
        outcome.empty_frames,
        outcome.failed_frames.len()
    );
}

fn run_producer<P: FrameStatsProducer>(producer: &P, frame: &FrameAssignment) -> FrameOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| producer.produce(frame))) {
        Ok(Ok(Some(stats))) if !stats.is_empty() => FrameOutcome::Stats(stats),
        Ok(Ok(_)) => FrameOutcome::Empty,
        Ok(Err(err)) => FrameOutcome::Failed(format!("{:#}", err)),
        Err(payload) => FrameOutcome::Failed(panic_message(payload)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
