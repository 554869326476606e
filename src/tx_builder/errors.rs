//! Error types for request building, offline signing and bundle output
//!
//! Errors are designed to be:
//! - Informative: Rich context for debugging and monitoring
//! - Composable: Easy to convert from underlying error types
//! - Observable: `category()` feeds metrics labels and log fields

use super::output::BundleError;
use crate::nonce_manager::NonceError;
use crate::rpc_manager::RpcManagerError;
use thiserror::Error;

/// Error type for all transaction builder operations
///
/// Covers the building lifecycle:
/// - Parameter validation at request construction
/// - Transaction population (nonce, gas, chain id)
/// - Signing and encoding
/// - Appending signed entries to bundle sinks
#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// Request parameters violate a construction-time constraint
    #[error("Invalid parameters for {kind}: {reason}")]
    InvalidParams {
        /// Operation kind the parameters belong to
        kind: &'static str,
        /// Detailed reason for the rejection
        reason: String,
    },

    /// Populating nonce, gas or chain id failed
    #[error("Populate failed: {0}")]
    Populate(String),

    /// Failed to sign the transaction
    ///
    /// This can indicate:
    /// - Identity/key mismatch with the request origin
    /// - Signer backend failure
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Nonce ledger errors
    #[error(transparent)]
    Nonce(#[from] NonceError),

    /// Remote client error while populating
    #[error(transparent)]
    Rpc(#[from] RpcManagerError),

    /// Bundle sink errors
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// Configuration or validation error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransactionBuilderError {
    /// Check if this error is potentially retryable
    ///
    /// Nothing in the harness retries automatically; the flag is carried into
    /// logs so an operator can tell a flaky endpoint from a broken request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(e) => e.is_retryable(),
            Self::Populate(_) => true,
            Self::Nonce(e) => e.is_retryable(),

            Self::InvalidParams { .. } => false,
            Self::Signing(_) => false,
            Self::Bundle(e) => e.is_retryable(),
            Self::Configuration(_) => false,
            Self::Internal(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidParams { .. } => "params",
            Self::Populate(_) => "populate",
            Self::Signing(_) => "signing",
            Self::Nonce(_) => "nonce",
            Self::Rpc(_) => "rpc",
            Self::Bundle(_) => "sink",
            Self::Configuration(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

// Convenience constructors for common error scenarios
impl TransactionBuilderError {
    /// Create a parameter validation error for an operation kind
    pub fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a signing failure error
    pub fn signing_failed(reason: impl Into<String>) -> Self {
        Self::Signing(reason.into())
    }
}
