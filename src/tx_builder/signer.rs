//! Offline population and signing
//!
//! [`OfflineSigner`] turns an [`OperationRequest`] into a fully populated,
//! signed legacy transaction without submitting it. Population reads chain
//! state through the [`ChainClient`]; the nonce comes from the shared
//! [`NonceLedger`] so that signing with one identity is serialized and nonces
//! stay contiguous.
//!
//! The same signer backs live dispatch: the live path submits the returned
//! bytes, the offline path appends them to a bundle sink.

use super::errors::TransactionBuilderError;
use super::output::SignedBundleEntry;
use super::requests::{BuildResult, OperationRequest};
use crate::metrics::{metrics, Timer};
use crate::nonce_manager::NonceLedger;
use crate::rpc_manager::ChainClient;
use crate::wallet::Identity;
use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Bytes, TxKind, U256};
use alloy_signer::SignerSync;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Populates and signs requests for any identity of the run
#[derive(Debug, Clone)]
pub struct OfflineSigner {
    client: Arc<dyn ChainClient>,
    ledger: Arc<NonceLedger>,
    chain_id_override: Option<u64>,
    chain_id: Arc<OnceCell<u64>>,
}

impl OfflineSigner {
    pub fn new(client: Arc<dyn ChainClient>, ledger: Arc<NonceLedger>) -> Self {
        Self {
            client,
            ledger,
            chain_id_override: None,
            chain_id: Arc::new(OnceCell::new()),
        }
    }

    /// Sign for a fixed chain id instead of asking the endpoint
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id_override = chain_id;
        self
    }

    pub fn ledger(&self) -> &Arc<NonceLedger> {
        &self.ledger
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Chain id for EIP-155, fetched once
    pub async fn chain_id(&self) -> BuildResult<u64> {
        if let Some(chain_id) = self.chain_id_override {
            return Ok(chain_id);
        }
        let chain_id = self
            .chain_id
            .get_or_try_init(|| async { self.client.chain_id().await })
            .await?;
        Ok(*chain_id)
    }

    /// Populate and sign `request` with `identity`
    ///
    /// Errors leave the identity's nonce unconsumed.
    pub async fn sign_offline(
        &self,
        identity: &Identity,
        request: &OperationRequest,
    ) -> BuildResult<SignedBundleEntry> {
        let timer = Timer::new();
        let result = self.populate_and_sign(identity, request).await;
        timer.observe_duration(&metrics().signing_latency);

        if let Err(ref e) = result {
            metrics()
                .signing_failures
                .with_label_values(&[e.category()])
                .inc();
            warn!(
                kind = %request.kind,
                signer = %identity.address(),
                error = %e,
                category = e.category(),
                "Offline signing failed"
            );
        }
        result
    }

    async fn populate_and_sign(
        &self,
        identity: &Identity,
        request: &OperationRequest,
    ) -> BuildResult<SignedBundleEntry> {
        if identity.address() != request.sender {
            return Err(TransactionBuilderError::signing_failed(format!(
                "identity {} (slot {}) cannot sign a {} request originating from {} (slot {})",
                identity.address(),
                identity.slot(),
                request.kind,
                request.sender,
                request.origin_slot
            )));
        }

        let chain_id = self.chain_id().await?;
        let input = request.calldata();

        let lease = self
            .ledger
            .lease(identity.address(), self.client.as_ref())
            .await?;

        let gas_price = match request.overrides.gas_price {
            Some(price) => price,
            None => self.client.gas_price().await?,
        };
        let gas_limit = match request.overrides.gas_limit {
            Some(limit) => limit,
            None => {
                self.client
                    .estimate_gas(identity.address(), request.target, input.clone())
                    .await?
            }
        };

        let tx = TxLegacy {
            chain_id: Some(chain_id),
            nonce: lease.nonce(),
            gas_price,
            gas_limit,
            to: TxKind::Call(request.target),
            value: U256::ZERO,
            input,
        };

        let signature = identity
            .signer()
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| TransactionBuilderError::signing_failed(e.to_string()))?;
        let envelope = TxEnvelope::Legacy(tx.into_signed(signature));
        let raw: Bytes = envelope.encoded_2718().into();
        let hash = *envelope.tx_hash();

        let nonce = lease.commit()?;
        debug!(
            kind = %request.kind,
            signer = %identity.address(),
            nonce,
            gas_price,
            gas_limit,
            tx_hash = %hash,
            "Signed operation"
        );

        Ok(SignedBundleEntry::new(
            request.kind,
            raw,
            identity.address(),
            nonce,
            hash,
        ))
    }
}
