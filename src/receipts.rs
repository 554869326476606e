//! Receipt classification
//!
//! A completed operation hands back a [`RawReceipt`]. Classification reduces it
//! to an [`Outcome`]: success iff the status field equals 1, with the block
//! number as the ordering position. Receipts with no status field are a
//! classification gap and come out as a failure with no ordinal; that path
//! never raises.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status value the chain uses for a successful transaction
pub const STATUS_SUCCESS: u64 = 1;

/// One emitted event, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    /// Decoded event name, when the topic matched a bound event
    pub name: Option<String>,
    /// Emitting contract
    pub address: Address,
    /// Non-indexed payload
    pub data: Bytes,
}

/// Raw completion result of a dispatched operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReceipt {
    pub status: Option<u64>,
    pub block_number: Option<u64>,
    pub tx_hash: Option<B256>,
    #[serde(default)]
    pub events: Vec<ReceiptEvent>,
}

impl RawReceipt {
    /// Receipt carrying a status and block number, no events
    pub fn with_status(status: u64, block_number: u64) -> Self {
        Self {
            status: Some(status),
            block_number: Some(block_number),
            ..Default::default()
        }
    }
}

/// Normalized outcome of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success {
        ordinal: Option<u64>,
    },
    Failure {
        reason: String,
        ordinal: Option<u64>,
    },
}

impl Outcome {
    /// The empty/failed sentinel for results with nothing to classify
    pub fn missing_status() -> Self {
        Outcome::Failure {
            reason: "missing status".to_string(),
            ordinal: None,
        }
    }

    /// Failure with no receipt at all (transport error, aborted task)
    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failure {
            reason: reason.into(),
            ordinal: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Block height the operation landed in, if known
    pub fn ordinal(&self) -> Option<u64> {
        match self {
            Outcome::Success { ordinal } | Outcome::Failure { ordinal, .. } => *ordinal,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let height = self
            .ordinal()
            .map(|h| h.to_string())
            .unwrap_or_default();
        match self {
            Outcome::Success { .. } => write!(f, "Tx Status:1 Height:{}", height),
            Outcome::Failure { reason, .. } => {
                write!(f, "Tx Status:failed ({}) Height:{}", reason, height)
            }
        }
    }
}

/// Classify a raw result
pub fn classify(raw: &RawReceipt) -> Outcome {
    match raw.status {
        Some(STATUS_SUCCESS) => Outcome::Success {
            ordinal: raw.block_number,
        },
        Some(status) => Outcome::Failure {
            reason: format!("status {}", status),
            ordinal: raw.block_number,
        },
        None => Outcome::missing_status(),
    }
}

/// Data of the first event named `event_name` in a successful receipt
///
/// Returns empty `Bytes` when the receipt did not succeed or no event
/// matches. Empty means "not found", not a fault.
pub fn extract_event(raw: &RawReceipt, event_name: &str) -> Bytes {
    if raw.status != Some(STATUS_SUCCESS) {
        return Bytes::new();
    }
    raw.events
        .iter()
        .find(|event| event.name.as_deref() == Some(event_name))
        .map(|event| event.data.clone())
        .unwrap_or_default()
}
