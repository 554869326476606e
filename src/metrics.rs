//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub operations_dispatched: IntCounter,
    pub outcomes_succeeded: IntCounter,
    pub outcomes_failed: IntCounter,
    pub batch_join_failures: IntCounter,
    pub flushes_total: IntCounter,
    pub bundle_entries: IntCounterVec,
    pub signing_failures: IntCounterVec,

    // Histograms
    pub flush_latency: Histogram,
    pub flush_size: Histogram,
    pub signing_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_dispatched = IntCounter::with_opts(Opts::new(
            "operations_dispatched_total",
            "Operations spawned into a batch window",
        ))?;

        let outcomes_succeeded = IntCounter::with_opts(Opts::new(
            "outcomes_succeeded_total",
            "Operations classified as successful",
        ))?;

        let outcomes_failed = IntCounter::with_opts(Opts::new(
            "outcomes_failed_total",
            "Operations classified as failed",
        ))?;

        let batch_join_failures = IntCounter::with_opts(Opts::new(
            "batch_join_failures_total",
            "Operation tasks that panicked or were aborted",
        ))?;

        let flushes_total =
            IntCounter::with_opts(Opts::new("flushes_total", "Non-empty batch flushes"))?;

        let bundle_entries = IntCounterVec::new(
            Opts::new("bundle_entries_total", "Signed entries appended to bundle sinks"),
            &["kind"],
        )?;

        let signing_failures = IntCounterVec::new(
            Opts::new("signing_failures_total", "Offline signing failures"),
            &["category"],
        )?;

        let flush_latency = Histogram::with_opts(
            HistogramOpts::new("flush_latency_seconds", "Time to join and classify a window")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        )?;

        let flush_size = Histogram::with_opts(
            HistogramOpts::new("flush_size", "Operations per flushed window")
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0]),
        )?;

        let signing_latency = Histogram::with_opts(
            HistogramOpts::new("signing_latency_seconds", "Populate plus sign latency")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;

        // Register all metrics
        registry.register(Box::new(operations_dispatched.clone()))?;
        registry.register(Box::new(outcomes_succeeded.clone()))?;
        registry.register(Box::new(outcomes_failed.clone()))?;
        registry.register(Box::new(batch_join_failures.clone()))?;
        registry.register(Box::new(flushes_total.clone()))?;
        registry.register(Box::new(bundle_entries.clone()))?;
        registry.register(Box::new(signing_failures.clone()))?;
        registry.register(Box::new(flush_latency.clone()))?;
        registry.register(Box::new(flush_size.clone()))?;
        registry.register(Box::new(signing_latency.clone()))?;

        Ok(Self {
            registry,
            operations_dispatched,
            outcomes_succeeded,
            outcomes_failed,
            batch_join_failures,
            flushes_total,
            bundle_entries,
            signing_failures,
            flush_latency,
            flush_size,
            signing_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
