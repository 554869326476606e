use crate::rpc_manager::RpcManagerError;
use alloy_primitives::Address;
use thiserror::Error;

/// Nonce ledger errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NonceError {
    /// Seeding the ledger from the chain failed
    #[error("Failed to seed nonce for {address}: {source}")]
    Seed {
        address: Address,
        #[source]
        source: RpcManagerError,
    },

    /// Local counter would overflow
    #[error("Nonce overflow for {0}")]
    Overflow(Address),

    /// Lease was used after it had already been committed
    #[error("Lease for {0} already committed")]
    AlreadyCommitted(Address),
}

impl NonceError {
    /// Check if this error is transient and retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NonceError::Seed { source, .. } => source.is_retryable(),
            NonceError::Overflow(_) => false,
            NonceError::AlreadyCommitted(_) => false,
        }
    }
}

/// Result type for nonce operations
pub type NonceResult<T> = Result<T, NonceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_error_display() {
        let err = NonceError::Overflow(Address::ZERO);
        assert_eq!(
            err.to_string(),
            "Nonce overflow for 0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_seed_error_inherits_retryability() {
        let err = NonceError::Seed {
            address: Address::ZERO,
            source: RpcManagerError::Transport {
                endpoint: "e".to_string(),
                message: "reset".to_string(),
            },
        };
        assert!(err.is_retryable());
        assert!(!NonceError::Overflow(Address::ZERO).is_retryable());
    }
}
