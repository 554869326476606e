//! Structured logging for benchmark runs
//!
//! Every event carries the run's `context_id` so a JSON log of a long run can
//! be split per run and joined against the bundle files it produced.

use crate::observability::{CorrelationId, PhaseContext};
use crate::receipts::Outcome;
use crate::tx_builder::output::SignedBundleEntry;
use crate::types::RunStats;

/// Structured logger for run events
#[derive(Debug, Clone)]
pub struct RunLogger {
    context_id: CorrelationId,
}

impl RunLogger {
    pub fn new(context_id: CorrelationId) -> Self {
        Self { context_id }
    }

    pub fn context_id(&self) -> &CorrelationId {
        &self.context_id
    }

    pub fn phase(&self, name: &str) -> PhaseContext {
        PhaseContext::new(&self.context_id, name)
    }

    pub fn log_run_start(&self, mode: &str, workload: &str, tokens: usize, participants: usize) {
        tracing::info!(
            context_id = %self.context_id,
            mode = %mode,
            workload = %workload,
            tokens,
            participants,
            "Benchmark run starting"
        );
    }

    pub fn log_phase_start(&self, phase: &PhaseContext) {
        tracing::info!(
            context_id = %self.context_id,
            span_id = %phase.span_id,
            phase = %phase.phase,
            "Phase started"
        );
    }

    pub fn log_phase_end(&self, phase: &PhaseContext, operations: usize) {
        tracing::info!(
            context_id = %self.context_id,
            span_id = %phase.span_id,
            phase = %phase.phase,
            operations,
            elapsed_secs = phase.elapsed_secs(),
            "Phase finished"
        );
    }

    /// One classified operation, in the "Tx Status:1 Height:N" format
    pub fn log_outcome(&self, flush: u64, label: &str, outcome: &Outcome) {
        if outcome.succeeded() {
            tracing::info!(
                context_id = %self.context_id,
                flush,
                operation = %label,
                height = ?outcome.ordinal(),
                "{}",
                outcome
            );
        } else {
            tracing::warn!(
                context_id = %self.context_id,
                flush,
                operation = %label,
                height = ?outcome.ordinal(),
                "{}",
                outcome
            );
        }
    }

    pub fn log_flush(&self, flush: u64, operations: usize, succeeded: usize, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            flush,
            operations,
            succeeded,
            failed = operations - succeeded,
            latency_ms,
            "Batch flushed"
        );
    }

    pub fn log_bundle_entry(&self, entry: &SignedBundleEntry) {
        tracing::debug!(
            context_id = %self.context_id,
            kind = %entry.kind,
            signer = %entry.signer,
            nonce = entry.nonce,
            tx_hash = %entry.hash,
            "Bundle entry written"
        );
    }

    pub fn log_run_summary(&self, stats: &RunStats) {
        tracing::debug!(
            context_id = %self.context_id,
            dispatched = stats.dispatched,
            succeeded = stats.succeeded,
            failed = stats.failed,
            flushes = stats.flushes,
            bundle_entries = stats.bundle_entries,
            "Run summary"
        );
    }
}
