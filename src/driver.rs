//! Benchmark driver
//!
//! Enumerates the workload matrix (token slots × participant pairs, or token
//! pairs × participant pairs for swaps) and either dispatches it live through
//! the [`ConcurrentBatcher`] or pre-signs it into bundle files.
//!
//! ## Phases
//!
//! Both modes walk the matrix one operation kind at a time:
//!
//! - token: the configured `token_kinds`, in order
//! - swap: `liquidity-mint → liquidity-approve → liquidity` (live, optional),
//!   then `mint → approve → swap`
//!
//! Live mode forces a flush at the end of each phase when `phase_barrier` is
//! set and always runs one final flush. Offline mode signs sequentially, so
//! nonces per identity are contiguous in each sink's file order.

use crate::batcher::{
    ConcurrentBatcher, LogSink, OperationFailure, OperationResult, OutcomeSink, PendingOperation,
};
use crate::config::{Config, ContractsConfig};
use crate::metrics::metrics;
use crate::nonce_manager::NonceLedger;
use crate::observability::{unix_now, CorrelationId};
use crate::rpc_manager::ChainClient;
use crate::structured_logging::RunLogger;
use crate::tx_builder::{
    mint_amounts, split, BundleWriter, OfflineSigner, OperationKind, OperationRequest,
    RequestBuilder,
};
use crate::types::{Mode, PoolStyle, RunStats, TokenHandle, Workload};
use crate::wallet::{Identity, IdentitySet};
use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 10^18, one whole token
const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Resolved run parameters
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub workload: Workload,
    pub pool_style: PoolStyle,
    pub price_ratio: U256,
    pub fee: u32,
    pub seed: u64,
    pub output_dir: PathBuf,
    pub token_kinds: Vec<OperationKind>,
    pub flush_threshold: usize,
    pub phase_barrier: bool,
    pub offline_gas_price: Option<u128>,
    pub swap_gas_price: Option<u128>,
    pub liquidity_gas_limit: Option<u64>,
    pub provide_liquidity: bool,
    pub liquidity_amount: U256,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            mode: config.workload.mode,
            workload: config.workload.kind,
            pool_style: config.pool_style()?,
            price_ratio: U256::from(config.workload.price_ratio),
            fee: config.workload.fee,
            seed: config.workload.seed,
            output_dir: config.workload.output_dir.clone(),
            token_kinds: config.workload.token_kinds.clone(),
            flush_threshold: config.live.flush_threshold,
            phase_barrier: config.live.phase_barrier,
            offline_gas_price: config.offline.gas_price.map(u128::from),
            swap_gas_price: config.swap.gas_price.map(u128::from),
            liquidity_gas_limit: config.swap.liquidity_gas_limit,
            provide_liquidity: config.swap.provide_liquidity,
            liquidity_amount: config.liquidity_amount(),
            request_timeout: Duration::from_secs(config.network.request_timeout_secs),
        })
    }
}

/// Everything a run needs, assembled once
#[derive(Debug, Clone)]
pub struct RunContext {
    pub identities: IdentitySet,
    pub tokens: Vec<TokenHandle>,
    pub contracts: ContractsConfig,
    pub client: Arc<dyn ChainClient>,
    pub signer: OfflineSigner,
    pub logger: RunLogger,
    pub settings: Settings,
}

impl RunContext {
    /// Derive identities and settings from `config`; the config must already
    /// have passed [`Config::validate`]
    pub fn from_config(config: &Config, client: Arc<dyn ChainClient>) -> Result<Self> {
        let mut identities = IdentitySet::from_keys(config.network.private_keys.as_slice())
            .context("Failed to derive signing identities")?;
        identities.truncate(config.participant_count());

        let ledger = Arc::new(NonceLedger::new());
        let signer = OfflineSigner::new(client.clone(), ledger).with_chain_id(config.network.chain_id);

        Ok(Self {
            identities,
            tokens: TokenHandle::sequence(&config.contracts.tokens),
            contracts: config.contracts.clone(),
            client,
            signer,
            logger: RunLogger::new(CorrelationId::new()),
            settings: Settings::from_config(config)?,
        })
    }
}

/// One token-workload combination
#[derive(Debug, Clone)]
struct TokenCell {
    token: TokenHandle,
    actor: Identity,
    peer: Identity,
    amount: U256,
}

/// One swap-workload combination, amounts already split by price
#[derive(Debug, Clone)]
struct SwapCell {
    token_a: TokenHandle,
    token_b: TokenHandle,
    actor: Identity,
    peer: Identity,
    amount_a: U256,
    amount_b: U256,
}

/// Where the swap nominal multiplier `k` comes from
enum Nominal {
    /// `k = j + 1`
    Slot,
    /// `k` uniform in `1..=4`
    Seeded(fastrand::Rng),
}

impl Nominal {
    fn next(&mut self, slot: usize) -> u64 {
        match self {
            Nominal::Slot => slot as u64 + 1,
            Nominal::Seeded(rng) => rng.u64(1..=4),
        }
    }
}

/// A named group of requests of one kind
#[derive(Debug)]
pub struct Phase {
    pub name: String,
    pub requests: Vec<OperationRequest>,
}

/// Drives one benchmark run
#[derive(Debug)]
pub struct BenchmarkDriver {
    ctx: RunContext,
    builder: RequestBuilder,
}

impl BenchmarkDriver {
    pub fn new(ctx: RunContext) -> Result<Self> {
        let mut builder = RequestBuilder::new(ctx.settings.fee)?
            .with_swap_gas_price(ctx.settings.swap_gas_price)
            .with_liquidity_gas_limit(ctx.settings.liquidity_gas_limit);
        if ctx.settings.mode == Mode::Offline {
            builder = builder.with_gas_price(ctx.settings.offline_gas_price);
        }
        Ok(Self { ctx, builder })
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Run in the configured mode
    pub async fn run(&self) -> Result<RunStats> {
        let settings = &self.ctx.settings;
        self.ctx.logger.log_run_start(
            &settings.mode.to_string(),
            &settings.workload.to_string(),
            self.ctx.tokens.len(),
            self.ctx.identities.len(),
        );

        let stats = match settings.mode {
            Mode::Live => {
                let sink = Arc::new(LogSink::new(self.ctx.logger.clone()));
                self.run_live(sink).await?
            }
            Mode::Offline => self.run_offline().await?,
        };

        self.ctx.logger.log_run_summary(&stats);
        Ok(stats)
    }

    /// Dispatch every phase through a batcher reporting to `sink`
    pub async fn run_live(&self, sink: Arc<dyn OutcomeSink>) -> Result<RunStats> {
        let settings = &self.ctx.settings;
        let batcher = ConcurrentBatcher::new(settings.flush_threshold, sink);
        let mut window = batcher.window();
        let mut sequence = 0u64;

        for name in self.phase_names() {
            let phase_ctx = self.ctx.logger.phase(&name);
            self.ctx.logger.log_phase_start(&phase_ctx);

            // Built per phase so swap and liquidity deadlines start now
            let phase = self.build_phase(&name, Nominal::Slot, unix_now())?;
            let count = phase.requests.len();
            for request in phase.requests {
                sequence += 1;
                let operation = self.dispatch(sequence, request)?;
                window = batcher.push(window, Some(operation)).await;
            }

            if settings.phase_barrier {
                window = batcher.flush(window).await;
            }
            self.ctx.logger.log_phase_end(&phase_ctx, count);
        }

        // Final flush of whatever the last phase left behind
        batcher.push(window, None).await;

        let totals = batcher.stats();
        Ok(RunStats {
            dispatched: totals.dispatched,
            succeeded: totals.succeeded,
            failed: totals.failed,
            flushes: totals.flushes,
            bundle_entries: 0,
        })
    }

    /// Sign every phase into bundle files under `output_dir`
    pub async fn run_offline(&self) -> Result<RunStats> {
        let settings = &self.ctx.settings;
        if settings.workload == Workload::Swap && settings.provide_liquidity {
            warn!("swap.provide_liquidity only applies to live runs; skipping liquidity phase");
        }

        let mut writer = BundleWriter::open(&settings.output_dir, settings.workload).await?;
        let phases = self.plan(Nominal::Seeded(fastrand::Rng::with_seed(settings.seed)), unix_now())?;

        let written = match self.write_phases(&mut writer, phases).await {
            Ok(written) => written,
            Err(e) => {
                // Entries already signed consumed nonces; keep them on disk
                match writer.finish().await {
                    Ok(per_kind) => warn!(
                        entries = per_kind.values().sum::<u64>(),
                        "Offline run aborted; flushed entries signed so far"
                    ),
                    Err(flush_err) => warn!("Failed to flush bundle after error: {}", flush_err),
                }
                return Err(e);
            }
        };

        let per_kind = writer.finish().await?;
        for (kind, entries) in &per_kind {
            info!(kind = %kind, entries, "Bundle sink closed");
        }

        Ok(RunStats {
            bundle_entries: written,
            ..RunStats::default()
        })
    }

    async fn write_phases(&self, writer: &mut BundleWriter, phases: Vec<Phase>) -> Result<u64> {
        let mut written = 0u64;
        for phase in phases {
            let phase_ctx = self.ctx.logger.phase(&phase.name);
            self.ctx.logger.log_phase_start(&phase_ctx);
            let count = phase.requests.len();

            for request in &phase.requests {
                let identity = self.identity(request.origin_slot)?;
                let entry = self
                    .ctx
                    .signer
                    .sign_offline(identity, request)
                    .await
                    .with_context(|| format!("Failed to sign {} for {}", request.kind, identity.address()))?;
                writer.append(&entry).await?;
                metrics()
                    .bundle_entries
                    .with_label_values(&[entry.kind.as_str()])
                    .inc();
                self.ctx.logger.log_bundle_entry(&entry);
                written += 1;
            }

            self.ctx.logger.log_phase_end(&phase_ctx, count);
        }
        Ok(written)
    }

    /// Every phase of the current mode, built at `now`
    pub fn plan_phases(&self, now: u64) -> Result<Vec<Phase>> {
        let nominal = match self.ctx.settings.mode {
            Mode::Live => Nominal::Slot,
            Mode::Offline => Nominal::Seeded(fastrand::Rng::with_seed(self.ctx.settings.seed)),
        };
        self.plan(nominal, now)
    }

    fn plan(&self, nominal: Nominal, now: u64) -> Result<Vec<Phase>> {
        let names = self.phase_names();
        match self.ctx.settings.workload {
            Workload::Token => {
                let cells = self.token_matrix();
                names
                    .iter()
                    .map(|name| self.token_phase(name, &cells))
                    .collect()
            }
            Workload::Swap => {
                // One draw per combination, shared by its mint, approve and swap
                let cells = self.swap_matrix(nominal);
                names
                    .iter()
                    .map(|name| self.swap_phase(name, &cells, now))
                    .collect()
            }
        }
    }

    fn build_phase(&self, name: &str, nominal: Nominal, now: u64) -> Result<Phase> {
        match self.ctx.settings.workload {
            Workload::Token => self.token_phase(name, &self.token_matrix()),
            Workload::Swap => self.swap_phase(name, &self.swap_matrix(nominal), now),
        }
    }

    fn phase_names(&self) -> Vec<String> {
        let settings = &self.ctx.settings;
        match settings.workload {
            Workload::Token => settings
                .token_kinds
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
            Workload::Swap => {
                let mut names = Vec::new();
                if settings.provide_liquidity && settings.mode == Mode::Live {
                    names.extend(["liquidity-mint", "liquidity-approve", "liquidity"].map(String::from));
                }
                names.extend(["mint", "approve", "swap"].map(String::from));
                names
            }
        }
    }

    fn token_matrix(&self) -> Vec<TokenCell> {
        let mut cells = Vec::new();
        for token in &self.ctx.tokens {
            for (actor, peer) in self.ctx.identities.pairs() {
                let multiplier = (actor.slot() % 4 + 1) as u128;
                cells.push(TokenCell {
                    token: *token,
                    actor: actor.clone(),
                    peer: peer.clone(),
                    amount: U256::from(WEI_PER_TOKEN * multiplier),
                });
            }
        }
        cells
    }

    fn swap_matrix(&self, mut nominal: Nominal) -> Vec<SwapCell> {
        let settings = &self.ctx.settings;
        let mut cells = Vec::new();
        for (a, b) in settings.pool_style.pairs(self.ctx.tokens.len()) {
            let (token_a, token_b) = (self.ctx.tokens[a], self.ctx.tokens[b]);
            for (actor, peer) in self.ctx.identities.pairs() {
                let k = nominal.next(actor.slot());
                let amount = U256::from(WEI_PER_TOKEN) * U256::from(k);
                let (amount_a, amount_b) =
                    mint_amounts(token_a.address, token_b.address, amount, settings.price_ratio);
                cells.push(SwapCell {
                    token_a,
                    token_b,
                    actor: actor.clone(),
                    peer: peer.clone(),
                    amount_a,
                    amount_b,
                });
            }
        }
        cells
    }

    fn token_phase(&self, name: &str, cells: &[TokenCell]) -> Result<Phase> {
        let kind = OperationKind::parse(name).ok_or_else(|| anyhow!("unknown token phase {}", name))?;
        let funder = self.ctx.identities.funding();
        let requests = cells
            .iter()
            .map(|c| self.builder.token_op(kind, funder, &c.actor, &c.peer, &c.token, c.amount))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Phase {
            name: name.to_string(),
            requests,
        })
    }

    fn swap_phase(&self, name: &str, cells: &[SwapCell], now: u64) -> Result<Phase> {
        let settings = &self.ctx.settings;
        let funder = self.ctx.identities.funding();
        let mut requests = Vec::new();

        match name {
            "mint" => {
                for c in cells {
                    requests.push(self.builder.mint(funder, &c.token_a, c.actor.address(), c.amount_a)?);
                    requests.push(self.builder.mint(funder, &c.token_b, c.peer.address(), c.amount_b)?);
                }
            }
            "approve" => {
                let router = self.router()?;
                // Live approvals leave headroom for a second swap
                let factor = match settings.mode {
                    Mode::Live => U256::from(2u8),
                    Mode::Offline => U256::from(1u8),
                };
                for c in cells {
                    requests.push(self.builder.approve(
                        &c.actor,
                        c.token_a.address,
                        router,
                        c.amount_a * factor,
                    )?);
                    requests.push(self.builder.approve(
                        &c.peer,
                        c.token_b.address,
                        router,
                        c.amount_b * factor,
                    )?);
                }
            }
            "swap" => {
                let engine = self.netting_engine()?;
                for c in cells {
                    requests.push(self.builder.swap(
                        &c.actor,
                        engine,
                        c.token_a.address,
                        c.token_b.address,
                        c.amount_a,
                        now,
                    )?);
                    requests.push(self.builder.swap(
                        &c.peer,
                        engine,
                        c.token_b.address,
                        c.token_a.address,
                        c.amount_b,
                        now,
                    )?);
                }
            }
            "liquidity-mint" | "liquidity-approve" | "liquidity" => {
                requests = self.liquidity_requests(name, now)?;
            }
            other => return Err(anyhow!("unknown swap phase {}", other)),
        }

        Ok(Phase {
            name: name.to_string(),
            requests,
        })
    }

    /// Full-range liquidity per pool, owned by the participant in the slot of
    /// the pool's first token
    fn liquidity_requests(&self, name: &str, now: u64) -> Result<Vec<OperationRequest>> {
        let settings = &self.ctx.settings;
        let position_manager = self
            .ctx
            .contracts
            .position_manager
            .ok_or_else(|| anyhow!("liquidity phase requires contracts.position_manager"))?;
        let funder = self.ctx.identities.funding();
        let mut requests = Vec::new();

        for (a, b) in settings.pool_style.pairs(self.ctx.tokens.len()) {
            let owner = self.identity(a % self.ctx.identities.len())?;
            let (token_a, token_b) = (self.ctx.tokens[a], self.ctx.tokens[b]);
            let amounts = split(
                token_a.address,
                token_b.address,
                settings.liquidity_amount,
                settings.price_ratio,
            );
            let handle = |address: Address| {
                if address == token_a.address {
                    token_a
                } else {
                    token_b
                }
            };

            match name {
                "liquidity-mint" => {
                    requests.push(self.builder.mint(funder, &handle(amounts.token0), owner.address(), amounts.amount0)?);
                    requests.push(self.builder.mint(funder, &handle(amounts.token1), owner.address(), amounts.amount1)?);
                }
                "liquidity-approve" => {
                    requests.push(self.builder.approve(owner, amounts.token0, position_manager, amounts.amount0)?);
                    requests.push(self.builder.approve(owner, amounts.token1, position_manager, amounts.amount1)?);
                }
                _ => {
                    requests.push(self.builder.add_liquidity(owner, position_manager, &amounts, now)?);
                }
            }
        }
        Ok(requests)
    }

    /// Spawn the live lifecycle of `request`: sign, submit, await receipt
    fn dispatch(&self, sequence: u64, request: OperationRequest) -> Result<PendingOperation> {
        let identity = self.identity(request.origin_slot)?.clone();
        let signer = self.ctx.signer.clone();
        let client = self.ctx.client.clone();
        let timeout = self.ctx.settings.request_timeout;
        let label = format!("{} #{} p{}", request.kind, sequence, request.origin_slot);

        Ok(PendingOperation::spawn(label, async move {
            submit(signer, client, identity, request, timeout).await
        }))
    }

    fn identity(&self, slot: usize) -> Result<&Identity> {
        self.ctx
            .identities
            .get(slot)
            .ok_or_else(|| anyhow!("no identity for participant slot {}", slot))
    }

    fn router(&self) -> Result<Address> {
        self.ctx
            .contracts
            .router
            .ok_or_else(|| anyhow!("swap workload requires contracts.router"))
    }

    fn netting_engine(&self) -> Result<Address> {
        self.ctx
            .contracts
            .netting_engine
            .ok_or_else(|| anyhow!("swap workload requires contracts.netting_engine"))
    }
}

/// Live operation body; every error stays inside the operation's outcome
async fn submit(
    signer: OfflineSigner,
    client: Arc<dyn ChainClient>,
    identity: Identity,
    request: OperationRequest,
    timeout: Duration,
) -> OperationResult {
    let entry = signer
        .sign_offline(&identity, &request)
        .await
        .map_err(|e| OperationFailure::new(format!("signing failed: {}", e)))?;

    let tx_hash = match tokio::time::timeout(timeout, client.send_raw(entry.raw.clone())).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => return Err(OperationFailure::new(format!("submission failed: {}", e))),
        Err(_) => {
            return Err(OperationFailure::new(format!(
                "submission timed out after {:?}",
                timeout
            )))
        }
    };

    client
        .wait_for_receipt(tx_hash)
        .await
        .map_err(|e| OperationFailure::new(format!("receipt wait failed: {}", e)))
}
