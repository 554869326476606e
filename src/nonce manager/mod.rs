//! Nonce Manager Module
//!
//! Serializes nonce assignment per signing identity

// Submodules
pub mod nonce_errors;
pub mod nonce_ledger;

// Re-exports for convenience
pub use nonce_errors::{NonceError, NonceResult};
pub use nonce_ledger::{NonceLease, NonceLedger};
