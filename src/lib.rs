//! txbench - EVM transaction load generator
//!
//! This library exposes the benchmark components so the binary, integration
//! tests and benches share one implementation:
//!
//! - [`tx_builder`]: request construction, offline signing, bundle files
//! - [`batcher`]: threshold-triggered concurrent dispatch
//! - [`driver`]: workload matrix and live/offline runs
//! - [`receipts`]: receipt classification

pub mod batcher;
pub mod config;
pub mod contracts;
pub mod driver;
pub mod metrics;
pub mod observability;
pub mod receipts;
pub mod structured_logging;
pub mod test_utils;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Component modules with non-standard paths (directories with spaces)
#[path = "nonce manager/mod.rs"]
pub mod nonce_manager;

#[path = "rpc manager/mod.rs"]
pub mod rpc_manager;

// Re-export commonly used types
pub use config::Config;
pub use driver::{BenchmarkDriver, RunContext};
pub use types::{Mode, RunStats, Workload};

#[cfg(test)]
mod tests {
    // Include test modules
    mod config_validation;
    mod driver_scenarios;
    mod nonce_concurrency_tests;
}
