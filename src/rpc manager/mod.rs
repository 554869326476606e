//! Remote operation interface
//!
//! The harness only ever talks to the chain through [`ChainClient`]: account
//! state for populating transactions, raw submission, and receipt waiting.

use crate::receipts::RawReceipt;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;

// Submodules
pub mod rpc_client;
pub mod rpc_errors;

// Re-exports for convenience
pub use rpc_client::RpcChainClient;
pub use rpc_errors::RpcManagerError;

pub type RpcResult<T> = Result<T, RpcManagerError>;

/// Async access to an EVM endpoint
#[async_trait]
pub trait ChainClient: Send + Sync + std::fmt::Debug {
    /// Chain id used for EIP-155 replay protection
    async fn chain_id(&self) -> RpcResult<u64>;

    /// Transaction count of `address` including pending transactions
    async fn pending_nonce(&self, address: Address) -> RpcResult<u64>;

    /// Current legacy gas price in wei
    async fn gas_price(&self) -> RpcResult<u128>;

    /// Gas estimate for a call from `from` to `to` with `input`
    async fn estimate_gas(&self, from: Address, to: Address, input: Bytes) -> RpcResult<u64>;

    /// Submit an EIP-2718 encoded signed transaction, returning its hash
    async fn send_raw(&self, raw: Bytes) -> RpcResult<B256>;

    /// Wait until the transaction is included and return its receipt
    async fn wait_for_receipt(&self, tx_hash: B256) -> RpcResult<RawReceipt>;
}
