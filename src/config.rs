//! Configuration module for txbench
//!
//! This module handles all configuration loading from TOML files,
//! environment variables, and provides structured configuration types.
//!
//! ## Environment overrides
//!
//! Applied after the file is parsed (a `.env` file is loaded first):
//! - `TXBENCH_RPC_URL`
//! - `TXBENCH_MODE` (`live` | `offline`)
//! - `TXBENCH_WORKLOAD` (`token` | `swap`)
//! - `TXBENCH_PRIVATE_KEYS` (comma separated)
//! - `TXBENCH_OUTPUT_DIR`

use crate::tx_builder::requests::OperationKind;
use crate::types::{Mode, PoolStyle, Workload};
use alloy_primitives::{Address, U256};
use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::PathBuf;
use zeroize::Zeroize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Endpoint and signing keys
    #[serde(default)]
    pub network: NetworkConfig,

    /// Deployed contract addresses
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Workload selection and shape
    #[serde(default)]
    pub workload: WorkloadConfig,

    /// Live dispatch tuning
    #[serde(default)]
    pub live: LiveConfig,

    /// Offline bundle tuning
    #[serde(default)]
    pub offline: OfflineConfig,

    /// Swap workload options
    #[serde(default)]
    pub swap: SwapConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Hex private keys, wiped from memory on drop
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PrivateKeys(Vec<String>);

impl PrivateKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for PrivateKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKeys([{} redacted])", self.0.len())
    }
}

impl Drop for PrivateKeys {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Sign for this chain id instead of querying the endpoint
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// One key per participant slot; slot 0 funds mints
    #[serde(default)]
    pub private_keys: PrivateKeys,

    /// Bound on a single submission call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Receipt polling interval
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    /// Give up waiting for a receipt after this long
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ContractsConfig {
    /// Token contracts in slot order
    #[serde(default)]
    pub tokens: Vec<Address>,

    /// Spender approved for swaps
    #[serde(default)]
    pub router: Option<Address>,

    /// Target of queued swaps
    #[serde(default)]
    pub netting_engine: Option<Address>,

    /// Target of liquidity mints
    #[serde(default)]
    pub position_manager: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub kind: Workload,

    /// 2 = disjoint pairs, 1 = chained pairs
    #[serde(default = "default_pool_style")]
    pub pool_style: u8,

    /// Use only the first N keys as participants
    #[serde(default)]
    pub participants: Option<usize>,

    /// Pool fee tier
    #[serde(default = "default_fee")]
    pub fee: u32,

    /// Divisor applied to the lower-addressed token of a pair
    #[serde(default = "default_price_ratio")]
    pub price_ratio: u64,

    /// Seed for offline swap amounts
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Root directory of bundle sinks
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Token workload kinds, in phase order
    #[serde(default = "default_token_kinds")]
    pub token_kinds: Vec<OperationKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// Window size that triggers a flush
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Force a flush at the end of every kind phase
    #[serde(default = "default_true")]
    pub phase_barrier: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineConfig {
    /// Fixed gas price (wei) for every bundle entry; unset = ask the endpoint
    #[serde(default = "default_offline_gas_price")]
    pub gas_price: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapConfig {
    /// Fixed gas price (wei) for swap-queue requests in both modes
    #[serde(default = "default_swap_gas_price")]
    pub gas_price: Option<u64>,

    /// Fixed gas limit for liquidity mints; swaps are always estimated
    #[serde(default = "default_liquidity_gas_limit")]
    pub liquidity_gas_limit: Option<u64>,

    /// Run the liquidity phase before swapping (live only)
    #[serde(default)]
    pub provide_liquidity: bool,

    /// Nominal liquidity per pair, in whole tokens (18 decimals)
    #[serde(default = "default_liquidity_tokens")]
    pub liquidity_tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Write the Prometheus text exposition here when the run ends
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,

    /// Emit JSON logs
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_rpc_url() -> String { "http://127.0.0.1:8545".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_receipt_poll_ms() -> u64 { 250 }
fn default_receipt_timeout() -> u64 { 120 }
fn default_pool_style() -> u8 { 2 }
fn default_fee() -> u32 { 3000 }
fn default_price_ratio() -> u64 { 4 }
fn default_seed() -> u64 { 42 }
fn default_output_dir() -> PathBuf { PathBuf::from("data") }
fn default_token_kinds() -> Vec<OperationKind> { OperationKind::TOKEN_KINDS.to_vec() }
fn default_flush_threshold() -> usize { 100 }
fn default_true() -> bool { true }
fn default_offline_gas_price() -> Option<u64> { Some(255) }
fn default_swap_gas_price() -> Option<u64> { Some(255) }
fn default_liquidity_gas_limit() -> Option<u64> { Some(500_000_000) }
fn default_liquidity_tokens() -> u64 { 1_000_000 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: None,
            private_keys: PrivateKeys::default(),
            request_timeout_secs: default_request_timeout(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_secs: default_receipt_timeout(),
        }
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            kind: Workload::default(),
            pool_style: default_pool_style(),
            participants: None,
            fee: default_fee(),
            price_ratio: default_price_ratio(),
            seed: default_seed(),
            output_dir: default_output_dir(),
            token_kinds: default_token_kinds(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            phase_barrier: default_true(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            gas_price: default_offline_gas_price(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            gas_price: default_swap_gas_price(),
            liquidity_gas_limit: default_liquidity_gas_limit(),
            provide_liquidity: false,
            liquidity_tokens: default_liquidity_tokens(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_path: None,
            json_logs: false,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid configuration TOML")?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml(&content)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TXBENCH_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TXBENCH_RPC_URL") {
            self.network.rpc_url = url;
        }
        if let Some(mode) = lookup("TXBENCH_MODE") {
            self.workload.mode = mode.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(kind) = lookup("TXBENCH_WORKLOAD") {
            self.workload.kind = kind.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(mut keys) = lookup("TXBENCH_PRIVATE_KEYS") {
            self.network.private_keys = PrivateKeys::new(
                keys.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
            keys.zeroize();
        }
        if let Some(dir) = lookup("TXBENCH_OUTPUT_DIR") {
            self.workload.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Number of participant slots the run will use
    pub fn participant_count(&self) -> usize {
        let available = self.network.private_keys.len();
        match self.workload.participants {
            Some(limit) => available.min(limit),
            None => available,
        }
    }

    pub fn pool_style(&self) -> anyhow::Result<PoolStyle> {
        PoolStyle::from_code(self.workload.pool_style).with_context(|| {
            format!(
                "pool_style must be 1 (chained) or 2 (disjoint), got {}",
                self.workload.pool_style
            )
        })
    }

    /// Nominal liquidity per pair in base units
    pub fn liquidity_amount(&self) -> U256 {
        U256::from(self.swap.liquidity_tokens) * U256::from(10u64).pow(U256::from(18u64))
    }

    /// Reject configurations the driver cannot run
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.network.private_keys.is_empty() {
            bail!("network.private_keys must contain at least one key");
        }
        if self.participant_count() < 2 {
            bail!(
                "at least 2 participants are required, got {}",
                self.participant_count()
            );
        }
        if self.contracts.tokens.is_empty() {
            bail!("contracts.tokens must list at least one token");
        }
        if self.contracts.tokens.iter().any(|t| t.is_zero()) {
            bail!("contracts.tokens contains the zero address");
        }
        if self.workload.price_ratio == 0 {
            bail!("workload.price_ratio must be non-zero");
        }
        if self.workload.fee >= 1 << 24 {
            bail!("workload.fee {} does not fit in uint24", self.workload.fee);
        }
        if self.live.flush_threshold == 0 {
            bail!("live.flush_threshold must be non-zero");
        }
        self.pool_style()?;

        match self.workload.kind {
            Workload::Token => {
                if self.workload.token_kinds.is_empty() {
                    bail!("workload.token_kinds must not be empty");
                }
                if let Some(kind) = self
                    .workload
                    .token_kinds
                    .iter()
                    .find(|k| !OperationKind::TOKEN_KINDS.contains(k))
                {
                    bail!("workload.token_kinds: {} is not a token operation", kind);
                }
            }
            Workload::Swap => {
                if self.contracts.tokens.len() < 2 {
                    bail!("swap workload needs at least 2 tokens");
                }
                if self.contracts.router.is_none() {
                    bail!("swap workload requires contracts.router");
                }
                if self.contracts.netting_engine.is_none() {
                    bail!("swap workload requires contracts.netting_engine");
                }
                if self.swap.provide_liquidity && self.contracts.position_manager.is_none() {
                    bail!("swap.provide_liquidity requires contracts.position_manager");
                }
            }
        }
        Ok(())
    }
}
