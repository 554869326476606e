//! Configuration parsing and validation tests

use crate::config::{Config, PrivateKeys};
use crate::test_utils::DEV_KEYS;
use crate::tx_builder::OperationKind;
use crate::types::{Mode, PoolStyle, Workload};
use alloy_primitives::{address, U256};
use std::collections::HashMap;
use std::path::PathBuf;

const SAMPLE: &str = r#"
[network]
rpc_url = "http://10.0.0.5:8545"
chain_id = 1337
private_keys = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
]

[contracts]
tokens = [
    "0x1000000000000000000000000000000000000001",
    "0x2000000000000000000000000000000000000002",
]
router = "0x3000000000000000000000000000000000000003"
netting_engine = "0x4000000000000000000000000000000000000004"

[workload]
mode = "offline"
kind = "swap"
pool_style = 1
token_kinds = ["mint", "transferFrom"]

[live]
flush_threshold = 10
phase_barrier = false

[offline]
gas_price = 1000

[swap]
gas_price = 7
"#;

fn valid_token_config() -> Config {
    let mut config = Config::default();
    config.network.private_keys =
        PrivateKeys::new(DEV_KEYS[..2].iter().map(|k| k.to_string()).collect());
    config.contracts.tokens = vec![address!("1000000000000000000000000000000000000001")];
    config
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.network.rpc_url, "http://127.0.0.1:8545");
    assert_eq!(config.workload.mode, Mode::Live);
    assert_eq!(config.workload.kind, Workload::Token);
    assert_eq!(config.workload.pool_style, 2);
    assert_eq!(config.workload.fee, 3000);
    assert_eq!(config.workload.price_ratio, 4);
    assert_eq!(config.workload.output_dir, PathBuf::from("data"));
    assert_eq!(config.workload.token_kinds, OperationKind::TOKEN_KINDS.to_vec());
    assert_eq!(config.live.flush_threshold, 100);
    assert!(config.live.phase_barrier);
    assert_eq!(config.offline.gas_price, Some(255));
    assert_eq!(config.swap.gas_price, Some(255));
    assert_eq!(config.swap.liquidity_gas_limit, Some(500_000_000));
}

#[test]
fn test_parse_sample() {
    let config = Config::from_toml(SAMPLE).unwrap();
    assert_eq!(config.network.rpc_url, "http://10.0.0.5:8545");
    assert_eq!(config.network.chain_id, Some(1337));
    assert_eq!(config.network.private_keys.len(), 2);
    assert_eq!(config.contracts.tokens.len(), 2);
    assert_eq!(config.workload.mode, Mode::Offline);
    assert_eq!(config.workload.kind, Workload::Swap);
    assert_eq!(config.pool_style().unwrap(), PoolStyle::Chained);
    assert_eq!(
        config.workload.token_kinds,
        vec![OperationKind::Mint, OperationKind::TransferFrom]
    );
    assert_eq!(config.live.flush_threshold, 10);
    assert!(!config.live.phase_barrier);
    assert_eq!(config.offline.gas_price, Some(1000));
    assert_eq!(config.swap.gas_price, Some(7));
    assert_eq!(config.swap.liquidity_gas_limit, Some(500_000_000));
    // Unlisted sections keep their defaults
    assert_eq!(config.network.request_timeout_secs, 30);
    config.validate().unwrap();
}

#[test]
fn test_rejects_unknown_mode() {
    let err = Config::from_toml("[workload]\nmode = \"replay\"\n").unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid configuration TOML"));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("TXBENCH_RPC_URL", "http://node:8545"),
        ("TXBENCH_MODE", "offline"),
        ("TXBENCH_WORKLOAD", "swap"),
        ("TXBENCH_PRIVATE_KEYS", " 0xaa, 0xbb ,,"),
        ("TXBENCH_OUTPUT_DIR", "/var/bundles"),
    ]);
    let mut config = Config::default();
    config
        .apply_env(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.network.rpc_url, "http://node:8545");
    assert_eq!(config.workload.mode, Mode::Offline);
    assert_eq!(config.workload.kind, Workload::Swap);
    assert_eq!(config.network.private_keys.as_slice(), &["0xaa", "0xbb"]);
    assert_eq!(config.workload.output_dir, PathBuf::from("/var/bundles"));
}

#[test]
fn test_env_rejects_bad_mode() {
    let mut config = Config::default();
    assert!(config
        .apply_env(|key| (key == "TXBENCH_MODE").then(|| "turbo".to_string()))
        .is_err());
}

#[test]
fn test_keys_are_redacted_in_debug() {
    let config = valid_token_config();
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains(DEV_KEYS[0]));
    assert!(rendered.contains("2 redacted"));
}

#[test]
fn test_participant_limit() {
    let mut config = valid_token_config();
    config.network.private_keys =
        PrivateKeys::new(DEV_KEYS.iter().map(|k| k.to_string()).collect());
    assert_eq!(config.participant_count(), 4);
    config.workload.participants = Some(2);
    assert_eq!(config.participant_count(), 2);
    config.workload.participants = Some(1);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_token_config() {
    let mut config = valid_token_config();
    config.validate().unwrap();

    config.workload.token_kinds = vec![OperationKind::SwapQueue];
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("not a token operation"));

    config.workload.token_kinds.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_numbers() {
    let mut config = valid_token_config();
    config.workload.price_ratio = 0;
    assert!(config.validate().is_err());

    let mut config = valid_token_config();
    config.workload.fee = 1 << 24;
    assert!(config.validate().is_err());

    let mut config = valid_token_config();
    config.live.flush_threshold = 0;
    assert!(config.validate().is_err());

    let mut config = valid_token_config();
    config.workload.pool_style = 3;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_token() {
    let mut config = valid_token_config();
    config.contracts.tokens.push(alloy_primitives::Address::ZERO);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_swap_requirements() {
    let mut config = valid_token_config();
    config.workload.kind = Workload::Swap;
    assert!(config.validate().is_err(), "one token is not a pool");

    config
        .contracts
        .tokens
        .push(address!("2000000000000000000000000000000000000002"));
    assert!(config.validate().is_err(), "router missing");

    config.contracts.router = Some(address!("3000000000000000000000000000000000000003"));
    config.contracts.netting_engine = Some(address!("4000000000000000000000000000000000000004"));
    config.validate().unwrap();

    config.swap.provide_liquidity = true;
    assert!(config.validate().is_err(), "position manager missing");
}

#[test]
fn test_liquidity_amount_scales_to_wei() {
    let mut config = Config::default();
    config.swap.liquidity_tokens = 3;
    assert_eq!(
        config.liquidity_amount(),
        U256::from(3_000_000_000_000_000_000u128)
    );
}
