use alloy_transport::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Remote client error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcManagerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// Timeout errors
    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// RPC response errors (from the JSON-RPC server)
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    /// Node rejected the nonce (already used or gapped)
    #[error("Nonce rejected (endpoint: {endpoint}): {message}")]
    NonceRejected { endpoint: String, message: String },

    /// Sender cannot pay for gas
    #[error("Insufficient funds (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RpcManagerError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcManagerError::Transport { .. } => true,
            RpcManagerError::Timeout { .. } => true,

            RpcManagerError::NonceRejected { .. } => false,
            RpcManagerError::InsufficientFunds { .. } => false,
            RpcManagerError::Configuration(_) => false,
            RpcManagerError::Internal(_) => false,

            RpcManagerError::RpcResponse { code, .. } => {
                // -32000..-32099 are server-defined; -32603 is internal error
                matches!(code, Some(-32603) | Some(-32005))
            }
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            RpcManagerError::Transport { .. } => "transport",
            RpcManagerError::Timeout { .. } => "timeout",
            RpcManagerError::RpcResponse { .. } => "rpc_response",
            RpcManagerError::NonceRejected { .. } => "nonce",
            RpcManagerError::InsufficientFunds { .. } => "funds",
            RpcManagerError::Configuration(_) => "config",
            RpcManagerError::Internal(_) => "internal",
        }
    }

    /// Get the endpoint associated with this error, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            RpcManagerError::Transport { endpoint, .. } => Some(endpoint),
            RpcManagerError::Timeout { endpoint, .. } => Some(endpoint),
            RpcManagerError::RpcResponse { endpoint, .. } => Some(endpoint),
            RpcManagerError::NonceRejected { endpoint, .. } => Some(endpoint),
            RpcManagerError::InsufficientFunds { endpoint } => Some(endpoint),
            _ => None,
        }
    }

    /// Create from an alloy transport error with endpoint context
    pub fn from_transport_error(err: RpcError<TransportErrorKind>, endpoint: &str) -> Self {
        match err {
            RpcError::ErrorResp(payload) => {
                Self::classify_message(payload.message.to_string(), Some(payload.code), endpoint)
            }
            RpcError::Transport(kind) => RpcManagerError::Transport {
                endpoint: endpoint.to_string(),
                message: kind.to_string(),
            },
            other => Self::classify_message(other.to_string(), None, endpoint),
        }
    }

    fn classify_message(message: String, code: Option<i64>, endpoint: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("nonce too low") || lower.contains("nonce too high") {
            RpcManagerError::NonceRejected {
                endpoint: endpoint.to_string(),
                message,
            }
        } else if lower.contains("insufficient funds") {
            RpcManagerError::InsufficientFunds {
                endpoint: endpoint.to_string(),
            }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            RpcManagerError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms: 0,
            }
        } else {
            RpcManagerError::RpcResponse {
                endpoint: endpoint.to_string(),
                message,
                code,
            }
        }
    }
}
