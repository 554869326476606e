//! Test Utilities Module
//!
//! This module provides a deterministic in-memory [`ChainClient`] so the
//! batcher, signer and driver can be exercised without a node.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::receipts::RawReceipt;
use crate::rpc_manager::{ChainClient, RpcManagerError, RpcResult};
use alloy_primitives::{keccak256, Address, Bytes, B256};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Anvil's deterministic development keys (accounts #0..#3)
pub const DEV_KEYS: [&str; 4] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
];

/// In-memory chain client
///
/// - Nonces default to 0 and can be preset per address
/// - Every accepted raw transaction gets the next block number
/// - Hashes listed via `revert_tx` come back with status 0
#[derive(Debug)]
pub struct MockChainClient {
    chain_id: u64,
    gas_price: u128,
    gas_estimate: u64,
    nonces: DashMap<Address, u64>,
    nonce_queries: AtomicU64,
    fail_nonce: AtomicBool,
    fail_nonce_for: Mutex<HashSet<Address>>,
    fail_send: AtomicBool,
    omit_status: AtomicBool,
    next_block: AtomicU64,
    receipt_delay: Mutex<Duration>,
    sent: Mutex<Vec<Bytes>>,
    reverted: Mutex<HashSet<B256>>,
    blocks: DashMap<B256, u64>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            chain_id: 31337,
            gas_price: 1_000_000_000,
            gas_estimate: 60_000,
            nonces: DashMap::new(),
            nonce_queries: AtomicU64::new(0),
            fail_nonce: AtomicBool::new(false),
            fail_nonce_for: Mutex::new(HashSet::new()),
            fail_send: AtomicBool::new(false),
            omit_status: AtomicBool::new(false),
            next_block: AtomicU64::new(1),
            receipt_delay: Mutex::new(Duration::ZERO),
            sent: Mutex::new(Vec::new()),
            reverted: Mutex::new(HashSet::new()),
            blocks: DashMap::new(),
        }
    }

    pub fn chain_id_value(&self) -> u64 {
        self.chain_id
    }

    pub fn gas_price_value(&self) -> u128 {
        self.gas_price
    }

    pub fn gas_estimate_value(&self) -> u64 {
        self.gas_estimate
    }

    pub fn set_pending_nonce(&self, address: Address, nonce: u64) {
        self.nonces.insert(address, nonce);
    }

    pub fn fail_nonce_queries(&self, fail: bool) {
        self.fail_nonce.store(fail, Ordering::SeqCst);
    }

    /// Nonce queries for `address` alone fail
    pub fn fail_nonce_for(&self, address: Address) {
        self.fail_nonce_for.lock().insert(address);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Receipts come back without a status field
    pub fn omit_status(&self, omit: bool) {
        self.omit_status.store(omit, Ordering::SeqCst);
    }

    pub fn set_receipt_delay(&self, delay: Duration) {
        *self.receipt_delay.lock() = delay;
    }

    pub fn revert_tx(&self, tx_hash: B256) {
        self.reverted.lock().insert(tx_hash);
    }

    pub fn nonce_queries(&self) -> u64 {
        self.nonce_queries.load(Ordering::SeqCst)
    }

    /// Raw transactions accepted so far, in arrival order
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(self.chain_id)
    }

    async fn pending_nonce(&self, address: Address) -> RpcResult<u64> {
        self.nonce_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_nonce.load(Ordering::SeqCst) || self.fail_nonce_for.lock().contains(&address) {
            return Err(RpcManagerError::Transport {
                endpoint: "mock".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.nonces.get(&address).map(|n| *n).unwrap_or(0))
    }

    async fn gas_price(&self) -> RpcResult<u128> {
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, _from: Address, _to: Address, _input: Bytes) -> RpcResult<u64> {
        Ok(self.gas_estimate)
    }

    async fn send_raw(&self, raw: Bytes) -> RpcResult<B256> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(RpcManagerError::RpcResponse {
                endpoint: "mock".to_string(),
                message: "transaction rejected".to_string(),
                code: Some(-32000),
            });
        }
        let hash = keccak256(&raw);
        let block = self.next_block.fetch_add(1, Ordering::SeqCst);
        self.blocks.insert(hash, block);
        self.sent.lock().push(raw);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> RpcResult<RawReceipt> {
        let delay = *self.receipt_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let block = self
            .blocks
            .get(&tx_hash)
            .map(|b| *b)
            .ok_or_else(|| RpcManagerError::Internal(format!("unknown tx {}", tx_hash)))?;

        if self.omit_status.load(Ordering::SeqCst) {
            return Ok(RawReceipt {
                tx_hash: Some(tx_hash),
                ..Default::default()
            });
        }

        let status = if self.reverted.lock().contains(&tx_hash) { 0 } else { 1 };
        let mut receipt = RawReceipt::with_status(status, block);
        receipt.tx_hash = Some(tx_hash);
        Ok(receipt)
    }
}
