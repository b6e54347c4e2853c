//! Bounded concurrent batch driver.
//!
//! One tokio task per image, gated by a semaphore. Tasks report back over a
//! bounded channel to a single aggregator, which owns the counts and invokes
//! the caller's progress callback in completion order.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};

use super::processor::FilePipeline;
use crate::types::{BatchSummary, FileReport, ImageRecord, Outcome};

/// Cooperative stop flag.
///
/// Once raised, no new files are dispatched; files already in flight run to
/// completion so nothing is left half-moved.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Completion count delivered with every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Dispatches images through a shared [`FilePipeline`] with bounded concurrency.
pub struct BatchRunner {
    pipeline: Arc<FilePipeline>,
    parallel: usize,
}

impl BatchRunner {
    pub fn new(pipeline: Arc<FilePipeline>, parallel: usize) -> Self {
        Self {
            pipeline,
            parallel: parallel.max(1),
        }
    }

    /// Process every file once and return the aggregate counts.
    ///
    /// `on_report` is called once per finished file, from a single task, with
    /// a monotonically increasing completion count. One file's failure or
    /// panic never affects another file.
    pub async fn run<F>(
        &self,
        files: Vec<ImageRecord>,
        stop: &StopSignal,
        mut on_report: F,
    ) -> BatchSummary
    where
        F: FnMut(&FileReport, Progress),
    {
        let start = Instant::now();
        let total = files.len();
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let (tx, mut rx) = mpsc::channel::<FileReport>(self.parallel * 2);

        let pipeline = &self.pipeline;
        let dispatch = async move {
            let mut handles = Vec::with_capacity(total);

            for record in files {
                if stop.is_stopped() {
                    break;
                }
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    tracing::warn!("Worker semaphore closed unexpectedly; stopping dispatch");
                    break;
                };
                if stop.is_stopped() {
                    break;
                }

                let pipeline = pipeline.clone();
                let tx = tx.clone();
                let path = record.path.clone();
                let handle = tokio::spawn(async move {
                    let report = process_contained(&pipeline, record).await;
                    drop(permit); // Release worker slot before reporting
                    let _ = tx.send(report).await;
                });
                handles.push((path, handle));
            }

            handles
        };

        let mut summary = BatchSummary {
            discovered: total,
            ..Default::default()
        };
        let mut completed = 0usize;

        let collect = async {
            while let Some(report) = rx.recv().await {
                completed += 1;
                summary.record(&report.outcome);
                on_report(&report, Progress { completed, total });
            }
        };

        let (handles, ()) = tokio::join!(dispatch, collect);

        // Every task has either reported or died; account for the latter.
        let dispatched = handles.len();
        for (path, handle) in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker for {:?} did not finish: {e}", path);
                let report = FileReport {
                    path,
                    sidecar: None,
                    outcome: Outcome::ProcessingError(format!("worker did not finish: {e}")),
                };
                completed += 1;
                summary.record(&report.outcome);
                on_report(&report, Progress { completed, total });
            }
        }

        summary.not_started = total - dispatched;
        if summary.not_started > 0 {
            tracing::warn!(
                "Batch stopped early; {} file(s) were not started",
                summary.not_started
            );
        }
        summary.elapsed = start.elapsed();
        summary
    }
}

/// Run the pipeline for one file, turning a panic into a failed outcome.
async fn process_contained(pipeline: &FilePipeline, record: ImageRecord) -> FileReport {
    match AssertUnwindSafe(pipeline.process(&record)).catch_unwind().await {
        Ok(report) => report,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("Pipeline for {:?} panicked: {message}", record.path);
            FileReport {
                path: record.path,
                sidecar: None,
                outcome: Outcome::ProcessingError(format!("panicked: {message}")),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
