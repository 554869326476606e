//! Concurrent batch dispatch
//!
//! Live operations are spawned as tokio tasks the moment they are pushed, so a
//! window of N pending operations means N operations in flight. When the
//! window reaches the flush threshold the batcher joins all of them, classifies
//! every result in submission order, hands the [`FlushReport`] to its
//! [`OutcomeSink`] and returns a fresh window.
//!
//! ## State machine
//!
//! `EMPTY -> FILLING -> FLUSHING -> EMPTY`
//!
//! - `push(window, Some(op))` appends; at `len >= threshold` it flushes
//! - `push(window, None)` / `flush(window)` flushes unconditionally
//! - flushing an empty window is a no-op: no report, no flush counted
//!
//! Failures stay per operation. A task that errors, reverts or panics becomes
//! a `Failure` outcome and never affects its siblings. Nothing is retried.

use crate::metrics::{metrics, Timer};
use crate::receipts::{classify, Outcome, RawReceipt};
use crate::structured_logging::RunLogger;
use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::error;

/// An operation that did not produce a clean receipt
///
/// `receipt` carries whatever partial receipt came back with the error; it is
/// classified instead of being discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub reason: String,
    pub receipt: Option<RawReceipt>,
}

impl OperationFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            receipt: None,
        }
    }

    pub fn with_receipt(reason: impl Into<String>, receipt: RawReceipt) -> Self {
        Self {
            reason: reason.into(),
            receipt: Some(receipt),
        }
    }
}

pub type OperationResult = Result<RawReceipt, OperationFailure>;

/// Handle to one in-flight operation
#[derive(Debug)]
pub struct PendingOperation {
    label: String,
    handle: JoinHandle<OperationResult>,
}

impl PendingOperation {
    /// Spawn `operation` onto the runtime; it starts running immediately
    pub fn spawn<F>(label: impl Into<String>, operation: F) -> Self
    where
        F: Future<Output = OperationResult> + Send + 'static,
    {
        Self {
            label: label.into(),
            handle: tokio::spawn(operation),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Operations pushed since the last flush
#[derive(Debug, Default)]
pub struct BatchWindow {
    pending: Vec<PendingOperation>,
}

impl BatchWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Classified results of one flush, in submission order
#[derive(Debug, Clone)]
pub struct FlushReport {
    /// 1-based flush sequence number
    pub flush: u64,
    pub outcomes: Vec<(String, Outcome)>,
    pub latency: Duration,
}

impl FlushReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// Receives every flush report
pub trait OutcomeSink: Send + Sync {
    fn report(&self, report: &FlushReport);
}

/// Default sink: one structured log line per outcome plus a flush summary
#[derive(Debug, Clone)]
pub struct LogSink {
    logger: RunLogger,
}

impl LogSink {
    pub fn new(logger: RunLogger) -> Self {
        Self { logger }
    }
}

impl OutcomeSink for LogSink {
    fn report(&self, report: &FlushReport) {
        for (label, outcome) in &report.outcomes {
            self.logger.log_outcome(report.flush, label, outcome);
        }
        self.logger.log_flush(
            report.flush,
            report.len(),
            report.succeeded(),
            report.latency.as_millis() as u64,
        );
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<FlushReport>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<FlushReport> {
        self.reports.lock().clone()
    }
}

impl OutcomeSink for CollectingSink {
    fn report(&self, report: &FlushReport) {
        self.reports.lock().push(report.clone());
    }
}

/// Running totals of a batcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatcherStats {
    pub dispatched: u64,
    pub flushes: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Threshold-triggered join-all batcher
pub struct ConcurrentBatcher {
    threshold: usize,
    sink: Arc<dyn OutcomeSink>,
    dispatched: AtomicU64,
    flushes: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl std::fmt::Debug for ConcurrentBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentBatcher")
            .field("threshold", &self.threshold)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ConcurrentBatcher {
    /// `threshold` is clamped to at least 1
    pub fn new(threshold: usize, sink: Arc<dyn OutcomeSink>) -> Self {
        Self {
            threshold: threshold.max(1),
            sink,
            dispatched: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Fresh window sized for this batcher
    pub fn window(&self) -> BatchWindow {
        BatchWindow::with_capacity(self.threshold)
    }

    /// Append `operation` (if any) and flush when the window is full
    ///
    /// `None` forces a flush. Callers must continue with the returned window.
    pub async fn push(
        &self,
        mut window: BatchWindow,
        operation: Option<PendingOperation>,
    ) -> BatchWindow {
        match operation {
            Some(operation) => {
                window.pending.push(operation);
                self.dispatched.fetch_add(1, Ordering::Relaxed);
                metrics().operations_dispatched.inc();
                if window.len() >= self.threshold {
                    self.flush(window).await
                } else {
                    window
                }
            }
            None => self.flush(window).await,
        }
    }

    /// Join every pending operation, report, and return an empty window
    pub async fn flush(&self, window: BatchWindow) -> BatchWindow {
        if window.is_empty() {
            return window;
        }

        let timer = Timer::new();
        let flush = self.flushes.fetch_add(1, Ordering::Relaxed) + 1;
        let (labels, handles): (Vec<_>, Vec<_>) = window
            .pending
            .into_iter()
            .map(|op| (op.label, op.handle))
            .unzip();

        let results = join_all(handles).await;

        let outcomes: Vec<(String, Outcome)> = labels
            .into_iter()
            .zip(results)
            .map(|(label, joined)| {
                let outcome = match joined {
                    Ok(Ok(receipt)) => classify(&receipt),
                    Ok(Err(failure)) => match failure.receipt {
                        Some(ref receipt) => classify(receipt),
                        None => Outcome::failed(failure.reason),
                    },
                    Err(join_error) => {
                        metrics().batch_join_failures.inc();
                        error!(
                            flush,
                            operation = %label,
                            error = %join_error,
                            "Operation task failed to join"
                        );
                        Outcome::failed(format!("task join failed: {}", join_error))
                    }
                };
                (label, outcome)
            })
            .collect();

        let report = FlushReport {
            flush,
            outcomes,
            latency: std::time::Duration::from_secs_f64(timer.elapsed_secs()),
        };

        let succeeded = report.succeeded() as u64;
        let failed = report.failed() as u64;
        self.succeeded.fetch_add(succeeded, Ordering::Relaxed);
        self.failed.fetch_add(failed, Ordering::Relaxed);

        let m = metrics();
        m.flushes_total.inc();
        m.outcomes_succeeded.inc_by(succeeded);
        m.outcomes_failed.inc_by(failed);
        m.flush_size.observe(report.len() as f64);
        timer.observe_duration(&m.flush_latency);

        self.sink.report(&report);
        self.window()
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> BatcherStats {
        BatcherStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
