//! Per-identity nonce serialization
//!
//! Every identity gets one async mutex guarding its next nonce. A
//! [`NonceLease`] holds that mutex from nonce assignment until the caller has
//! signed, so two operations of the same identity can never be populated with
//! the same nonce, whether they come from one batch window or from the
//! sequential offline signer.
//!
//! The counter is seeded from the chain's pending transaction count on first
//! use and advanced locally afterwards. Offline bundles never reach the chain
//! while they are generated, so re-querying would hand out the same nonce for
//! every entry.
//!
//! # Lifecycle
//!
//! 1. `lease(address, client)` waits for the identity's lock
//! 2. The lease exposes the nonce to sign with
//! 3. `commit()` advances the counter; dropping without commit leaves it
//!    untouched (signing failed, the nonce is still free)

use super::nonce_errors::{NonceError, NonceResult};
use crate::rpc_manager::ChainClient;
use alloy_primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Next-nonce counters keyed by identity address
#[derive(Debug, Default)]
pub struct NonceLedger {
    slots: DashMap<Address, Arc<Mutex<Option<u64>>>>,
}

impl NonceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the identity's lock and resolve its next nonce
    pub async fn lease(
        &self,
        address: Address,
        client: &dyn ChainClient,
    ) -> NonceResult<NonceLease> {
        // Clone the Arc out so the DashMap shard lock is not held across await
        let slot = self
            .slots
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut guard = slot.lock_owned().await;
        let nonce = match *guard {
            Some(next) => next,
            None => {
                let seeded = client
                    .pending_nonce(address)
                    .await
                    .map_err(|source| NonceError::Seed { address, source })?;
                debug!(%address, nonce = seeded, "Seeded nonce from chain");
                *guard = Some(seeded);
                seeded
            }
        };

        Ok(NonceLease {
            address,
            nonce,
            guard: Some(guard),
        })
    }

    /// Next nonce the ledger would hand out, if the identity has been seeded
    pub async fn peek(&self, address: Address) -> Option<u64> {
        let slot = self.slots.get(&address)?.clone();
        let value = *slot.lock().await;
        value
    }

    /// Number of identities with a counter
    pub fn tracked(&self) -> usize {
        self.slots.len()
    }
}

/// Exclusive claim on one identity's next nonce
pub struct NonceLease {
    address: Address,
    nonce: u64,
    guard: Option<OwnedMutexGuard<Option<u64>>>,
}

impl std::fmt::Debug for NonceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceLease")
            .field("address", &self.address)
            .field("nonce", &self.nonce)
            .field("held", &self.guard.is_some())
            .finish()
    }
}

impl NonceLease {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Mark the nonce as consumed and release the identity's lock
    pub fn commit(mut self) -> NonceResult<u64> {
        let mut guard = self
            .guard
            .take()
            .ok_or(NonceError::AlreadyCommitted(self.address))?;
        let next = self
            .nonce
            .checked_add(1)
            .ok_or(NonceError::Overflow(self.address))?;
        *guard = Some(next);
        Ok(self.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChainClient;
    use std::collections::HashSet;

    const ALICE: Address = Address::repeat_byte(0xa1);

    #[tokio::test]
    async fn test_seed_then_advance_locally() {
        let client = MockChainClient::new();
        client.set_pending_nonce(ALICE, 7);
        let ledger = NonceLedger::new();

        let lease = ledger.lease(ALICE, &client).await.unwrap();
        assert_eq!(lease.nonce(), 7);
        assert_eq!(lease.commit().unwrap(), 7);

        let lease = ledger.lease(ALICE, &client).await.unwrap();
        assert_eq!(lease.nonce(), 8);
        lease.commit().unwrap();

        assert_eq!(ledger.peek(ALICE).await, Some(9));
        assert_eq!(client.nonce_queries(), 1);
    }

    #[tokio::test]
    async fn test_dropped_lease_does_not_consume() {
        let client = MockChainClient::new();
        let ledger = NonceLedger::new();

        let lease = ledger.lease(ALICE, &client).await.unwrap();
        assert_eq!(lease.nonce(), 0);
        drop(lease);

        let lease = ledger.lease(ALICE, &client).await.unwrap();
        assert_eq!(lease.nonce(), 0);
    }

    #[tokio::test]
    async fn test_seed_failure_leaves_slot_unseeded() {
        let client = MockChainClient::new();
        client.fail_nonce_queries(true);
        let ledger = NonceLedger::new();

        let err = ledger.lease(ALICE, &client).await.unwrap_err();
        assert!(matches!(err, NonceError::Seed { .. }));
        assert_eq!(ledger.peek(ALICE).await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_leases_are_distinct() {
        const TASKS: usize = 64;

        let client = Arc::new(MockChainClient::new());
        let ledger = Arc::new(NonceLedger::new());

        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let client = client.clone();
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let lease = ledger.lease(ALICE, client.as_ref()).await.unwrap();
                tokio::task::yield_now().await;
                lease.commit().unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen, (0..TASKS as u64).collect::<HashSet<_>>());
        assert_eq!(ledger.tracked(), 1);
    }
}
