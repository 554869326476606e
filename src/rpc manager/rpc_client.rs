//! JSON-RPC implementation of [`ChainClient`] over alloy's HTTP provider

use super::{ChainClient, RpcManagerError, RpcResult};
use crate::contracts;
use crate::receipts::{RawReceipt, ReceiptEvent};
use alloy_network::{Ethereum, ReceiptResponse};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// HTTP JSON-RPC client
#[derive(Debug, Clone)]
pub struct RpcChainClient {
    provider: RootProvider<Ethereum>,
    endpoint: String,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

impl RpcChainClient {
    /// Connect to `endpoint` (no request is made until first use)
    pub fn connect(
        endpoint: &str,
        receipt_poll_interval: Duration,
        receipt_timeout: Duration,
    ) -> RpcResult<Self> {
        let url = endpoint
            .parse()
            .map_err(|e| RpcManagerError::Configuration(format!("invalid rpc url {}: {}", endpoint, e)))?;
        let client = RpcClient::builder().http(url);

        Ok(Self {
            provider: RootProvider::<Ethereum>::new(client),
            endpoint: endpoint.to_string(),
            receipt_poll_interval,
            receipt_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_err(&self, err: alloy_transport::TransportError) -> RpcManagerError {
        RpcManagerError::from_transport_error(err, &self.endpoint)
    }
}

/// Convert an RPC receipt, naming logs whose topic0 matches a bound event
fn to_raw_receipt(receipt: &TransactionReceipt) -> RawReceipt {
    let events = receipt
        .inner
        .logs()
        .iter()
        .map(|log| ReceiptEvent {
            name: log
                .topics()
                .first()
                .and_then(contracts::event_name)
                .map(str::to_string),
            address: log.address(),
            data: log.data().data.clone(),
        })
        .collect();

    RawReceipt {
        status: Some(u64::from(receipt.status())),
        block_number: receipt.block_number,
        tx_hash: Some(receipt.transaction_hash),
        events,
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> RpcResult<u64> {
        self.provider.get_chain_id().await.map_err(|e| self.map_err(e))
    }

    async fn pending_nonce(&self, address: Address) -> RpcResult<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn gas_price(&self) -> RpcResult<u128> {
        self.provider.get_gas_price().await.map_err(|e| self.map_err(e))
    }

    async fn estimate_gas(&self, from: Address, to: Address, input: Bytes) -> RpcResult<u64> {
        let request = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(input.into());
        self.provider
            .estimate_gas(request)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn send_raw(&self, raw: Bytes) -> RpcResult<B256> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> RpcResult<RawReceipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self
                    .provider
                    .get_transaction_receipt(tx_hash)
                    .await
                    .map_err(|e| self.map_err(e))?
                {
                    return Ok::<_, RpcManagerError>(to_raw_receipt(&receipt));
                }
                debug!(%tx_hash, "Receipt not yet available");
                sleep(self.receipt_poll_interval).await;
            }
        };

        timeout(self.receipt_timeout, poll)
            .await
            .map_err(|_| RpcManagerError::Timeout {
                endpoint: self.endpoint.clone(),
                timeout_ms: self.receipt_timeout.as_millis() as u64,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_bad_url() {
        let err = RpcChainClient::connect(
            "not a url",
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_connect_accepts_http_url() {
        let client = RpcChainClient::connect(
            "http://127.0.0.1:8545",
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8545");
    }
}
