//! Integration test for offline bundle generation
//!
//! This test validates:
//! - A full offline token run through the public API
//! - Record framing in every sink
//! - Per-identity nonce continuity across sinks
//! - Chain id override without touching the endpoint

use alloy_consensus::transaction::SignerRecoverable;
use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{address, Address};
use std::collections::HashMap;
use std::sync::Arc;
use txbench::config::PrivateKeys;
use txbench::rpc_manager::ChainClient;
use txbench::test_utils::{MockChainClient, DEV_KEYS};
use txbench::tx_builder::output::{sink_path, RECORD_TERMINATOR};
use txbench::tx_builder::OperationKind;
use txbench::{BenchmarkDriver, Config, Mode, RunContext, Workload};

fn offline_config(output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.network.private_keys =
        PrivateKeys::new(DEV_KEYS.iter().map(|k| k.to_string()).collect());
    config.network.chain_id = Some(8453);
    config.contracts.tokens = vec![
        address!("1000000000000000000000000000000000000001"),
        address!("2000000000000000000000000000000000000002"),
    ];
    config.workload.mode = Mode::Offline;
    config.workload.kind = Workload::Token;
    config.workload.output_dir = output_dir.to_path_buf();
    config
}

fn decode_sink(root: &std::path::Path, kind: OperationKind) -> Vec<TxEnvelope> {
    let path = root.join(sink_path(Workload::Token, kind).unwrap());
    let content = std::fs::read_to_string(path).unwrap();
    content
        .split(RECORD_TERMINATOR)
        .filter(|r| !r.is_empty())
        .map(|record| {
            assert!(record.starts_with("0x"));
            let raw = hex::decode(&record[2..]).unwrap();
            TxEnvelope::decode_2718(&mut raw.as_slice()).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_offline_token_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());
    config.validate().unwrap();

    let mock = Arc::new(MockChainClient::new());
    let client: Arc<dyn ChainClient> = mock.clone();
    let driver = BenchmarkDriver::new(RunContext::from_config(&config, client).unwrap()).unwrap();
    let stats = driver.run().await.unwrap();

    // 2 tokens × 2 participant pairs × 4 kinds
    assert_eq!(stats.bundle_entries, 16);
    assert_eq!(stats.dispatched, 0);
    assert!(mock.sent().is_empty());

    let mut per_signer: HashMap<Address, Vec<u64>> = HashMap::new();
    for kind in OperationKind::TOKEN_KINDS {
        let txs = decode_sink(dir.path(), kind);
        assert_eq!(txs.len(), 4, "{} sink", kind);
        for tx in txs {
            assert_eq!(tx.chain_id(), Some(8453));
            assert_eq!(tx.gas_price(), Some(255));
            let signer = tx.recover_signer().unwrap();
            per_signer.entry(signer).or_default().push(tx.nonce());
        }
    }

    // Every identity's nonces form one contiguous run from 0
    for (signer, mut nonces) in per_signer {
        nonces.sort_unstable();
        let expected: Vec<u64> = (0..nonces.len() as u64).collect();
        assert_eq!(nonces, expected, "nonces of {}", signer);
    }
}

#[tokio::test]
async fn test_offline_mints_signed_by_funding_identity() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let client: Arc<dyn ChainClient> = Arc::new(MockChainClient::new());
    let driver = BenchmarkDriver::new(RunContext::from_config(&config, client).unwrap()).unwrap();
    driver.run_offline().await.unwrap();

    let funder = driver.context().identities.funding().address();
    for tx in decode_sink(dir.path(), OperationKind::Mint) {
        assert_eq!(tx.recover_signer().unwrap(), funder);
    }
}
