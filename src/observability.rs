//! Observability module for correlation and tracing

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Correlation ID tying every event of one run together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Context of one live phase or offline pass
///
/// Phases of a run share the run's correlation id; each gets its own span id
/// so flush reports can be attributed to the phase that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseContext {
    pub correlation_id: CorrelationId,
    pub span_id: String,
    pub phase: String,
    /// Creation timestamp (Unix epoch seconds)
    pub started_at: u64,
}

impl PhaseContext {
    pub fn new(correlation_id: &CorrelationId, phase: &str) -> Self {
        Self {
            correlation_id: correlation_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            phase: phase.to_string(),
            started_at: unix_now(),
        }
    }

    /// Seconds since the phase started
    pub fn elapsed_secs(&self) -> u64 {
        unix_now().saturating_sub(self.started_at)
    }
}

/// Wall clock in Unix seconds; a clock before the epoch reads as 0
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
