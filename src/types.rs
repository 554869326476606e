//! Common types used throughout the application

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Dispatch operations against the endpoint and wait for receipts
    #[default]
    Live,
    /// Sign operations and write them to bundle files without submitting
    Offline,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "offline" => Ok(Mode::Offline),
            other => Err(format!("unknown mode '{}' (expected live or offline)", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Offline => write!(f, "offline"),
        }
    }
}

/// Which operation matrix to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    /// mint / transfer / approve / transferFrom per token
    #[default]
    Token,
    /// mint / approve / swap-queue per token pair
    Swap,
}

impl FromStr for Workload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(Workload::Token),
            "swap" => Ok(Workload::Swap),
            other => Err(format!("unknown workload '{}' (expected token or swap)", other)),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Token => write!(f, "token"),
            Workload::Swap => write!(f, "swap"),
        }
    }
}

/// How token slots are grouped into pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStyle {
    /// (0,1), (1,2), (2,3), ...
    Chained,
    /// (0,1), (2,3), ...
    Disjoint,
}

impl PoolStyle {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PoolStyle::Chained),
            2 => Some(PoolStyle::Disjoint),
            _ => None,
        }
    }

    /// Token slot pairs for `token_count` tokens
    pub fn pairs(self, token_count: usize) -> Vec<(usize, usize)> {
        let step = match self {
            PoolStyle::Chained => 1,
            PoolStyle::Disjoint => 2,
        };
        (0..token_count.saturating_sub(1))
            .step_by(step)
            .map(|i| (i, i + 1))
            .collect()
    }
}

/// A deployed token contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHandle {
    /// Contract address
    pub address: Address,
    /// Display index (token slot)
    pub index: usize,
}

impl TokenHandle {
    pub fn new(index: usize, address: Address) -> Self {
        Self { address, index }
    }

    /// Ordered handles from a list of addresses
    pub fn sequence(addresses: &[Address]) -> Vec<TokenHandle> {
        addresses
            .iter()
            .enumerate()
            .map(|(index, address)| TokenHandle::new(index, *address))
            .collect()
    }
}

impl fmt::Display for TokenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token{}({})", self.index, self.address)
    }
}

/// Counters summarizing one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Operations handed to the batcher
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Non-empty flushes performed
    pub flushes: u64,
    /// Signed entries appended to bundle sinks
    pub bundle_entries: u64,
}
