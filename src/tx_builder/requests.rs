//! Operation request construction
//!
//! [`RequestBuilder`] turns workload inputs into typed [`OperationRequest`]s.
//! It never touches the chain: wall-clock deadlines come in through an
//! explicit `now` so the same inputs always produce the same request.
//!
//! ## Kinds
//! - **Mint / Transfer / Approve / TransferFrom**: calls on a token contract
//! - **SwapQueue**: `queueSwapRequest` on the netting engine
//! - **LiquidityMint**: full-range `mint` on the position manager
//!
//! Parameter structs validate at construction; an `OperationRequest` that
//! exists is well-formed and is never mutated afterwards.

use super::errors::TransactionBuilderError;
use crate::contracts::{
    ExactInputSingleParams, INettingEngine, INonfungiblePositionManager, IToken,
    PositionMintParams,
};
use crate::tx_builder::amounts::SplitAmounts;
use crate::types::TokenHandle;
use crate::wallet::Identity;
use alloy_primitives::aliases::{I24, U160, U24};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap deadline window
pub const SWAP_DEADLINE_SECS: u64 = 10 * 60;
/// Liquidity provisioning deadline window
pub const LIQUIDITY_DEADLINE_SECS: u64 = 20 * 60;
/// Full-range tick bounds for a 60-spacing pool
pub const MIN_TICK: i32 = -887_220;
pub const MAX_TICK: i32 = 887_220;
/// Default pool fee tier (0.3%)
pub const DEFAULT_FEE: u32 = 3000;

const MAX_UINT24: u32 = (1 << 24) - 1;

pub type BuildResult<T> = Result<T, TransactionBuilderError>;

/// Kind of on-chain operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Mint,
    Transfer,
    Approve,
    TransferFrom,
    #[serde(rename = "swap")]
    SwapQueue,
    #[serde(rename = "liquidity")]
    LiquidityMint,
}

impl OperationKind {
    /// Token-contract kinds in live phase order
    pub const TOKEN_KINDS: [OperationKind; 4] = [
        OperationKind::Mint,
        OperationKind::Transfer,
        OperationKind::Approve,
        OperationKind::TransferFrom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Mint => "mint",
            OperationKind::Transfer => "transfer",
            OperationKind::Approve => "approve",
            OperationKind::TransferFrom => "transferFrom",
            OperationKind::SwapQueue => "swap",
            OperationKind::LiquidityMint => "liquidity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mint" => Some(OperationKind::Mint),
            "transfer" => Some(OperationKind::Transfer),
            "approve" => Some(OperationKind::Approve),
            "transferFrom" | "transfer_from" => Some(OperationKind::TransferFrom),
            "swap" => Some(OperationKind::SwapQueue),
            "liquidity" => Some(OperationKind::LiquidityMint),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    pub to: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub to: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveParams {
    pub spender: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFromParams {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Queued single-hop swap
///
/// No slippage protection and no price limit: `amount_out_minimum` and
/// `sqrt_price_limit_x96` are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub sqrt_price_limit_x96: U160,
}

/// Full-range liquidity position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityParams {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub recipient: Address,
    pub deadline: u64,
}

impl LiquidityParams {
    /// Validate ordering constraints the position manager enforces
    pub fn validate(&self) -> BuildResult<()> {
        let kind = OperationKind::LiquidityMint.as_str();
        if self.token0 >= self.token1 {
            return Err(TransactionBuilderError::invalid(
                kind,
                format!("token0 {} must sort below token1 {}", self.token0, self.token1),
            ));
        }
        if self.tick_lower >= self.tick_upper {
            return Err(TransactionBuilderError::invalid(
                kind,
                format!(
                    "tick_lower {} must be below tick_upper {}",
                    self.tick_lower, self.tick_upper
                ),
            ));
        }
        Ok(())
    }
}

/// Typed call parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationCall {
    Mint(MintParams),
    Transfer(TransferParams),
    Approve(ApproveParams),
    TransferFrom(TransferFromParams),
    SwapQueue(SwapParams),
    LiquidityMint(LiquidityParams),
}

/// Per-operation transaction field overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOverrides {
    /// Fixed gas price in wei instead of the endpoint's current price
    pub gas_price: Option<u128>,
    /// Fixed gas limit instead of an estimate
    pub gas_limit: Option<u64>,
}

/// One operation ready for dispatch or offline signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    /// Contract the call is sent to
    pub target: Address,
    pub call: OperationCall,
    /// Participant slot of the identity that must sign
    pub origin_slot: usize,
    /// Address of that identity
    pub sender: Address,
    pub overrides: TxOverrides,
}

impl OperationRequest {
    /// ABI-encoded calldata for the call
    pub fn calldata(&self) -> Bytes {
        let encoded = match &self.call {
            OperationCall::Mint(p) => IToken::mintCall {
                to: p.to,
                amount: p.amount,
            }
            .abi_encode(),
            OperationCall::Transfer(p) => IToken::transferCall {
                to: p.to,
                amount: p.amount,
            }
            .abi_encode(),
            OperationCall::Approve(p) => IToken::approveCall {
                spender: p.spender,
                amount: p.amount,
            }
            .abi_encode(),
            OperationCall::TransferFrom(p) => IToken::transferFromCall {
                from: p.from,
                to: p.to,
                amount: p.amount,
            }
            .abi_encode(),
            OperationCall::SwapQueue(p) => INettingEngine::queueSwapRequestCall {
                params: ExactInputSingleParams {
                    tokenIn: p.token_in,
                    tokenOut: p.token_out,
                    fee: U24::from(p.fee),
                    recipient: p.recipient,
                    deadline: U256::from(p.deadline),
                    amountIn: p.amount_in,
                    amountOutMinimum: p.amount_out_minimum,
                    sqrtPriceLimitX96: p.sqrt_price_limit_x96,
                },
            }
            .abi_encode(),
            OperationCall::LiquidityMint(p) => INonfungiblePositionManager::mintCall {
                params: PositionMintParams {
                    token0: p.token0,
                    token1: p.token1,
                    fee: U24::from(p.fee),
                    tickLower: tick(p.tick_lower),
                    tickUpper: tick(p.tick_upper),
                    amount0Desired: p.amount0_desired,
                    amount1Desired: p.amount1_desired,
                    amount0Min: p.amount0_min,
                    amount1Min: p.amount1_min,
                    recipient: p.recipient,
                    deadline: U256::from(p.deadline),
                },
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }

    pub fn with_overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

// Ticks are range-checked against MIN_TICK/MAX_TICK-sized values at
// construction, which always fit in 24 bits.
fn tick(value: i32) -> I24 {
    I24::try_from(value).unwrap_or(I24::ZERO)
}

/// Builds typed requests from workload inputs
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    fee: u32,
    /// Applied to every request
    base_overrides: TxOverrides,
    /// Gas price applied to swap-queue requests
    swap_gas_price: Option<u128>,
    /// Gas limit applied to liquidity mints
    liquidity_gas_limit: Option<u64>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            fee: DEFAULT_FEE,
            base_overrides: TxOverrides::default(),
            swap_gas_price: None,
            liquidity_gas_limit: None,
        }
    }
}

impl RequestBuilder {
    pub fn new(fee: u32) -> BuildResult<Self> {
        if fee > MAX_UINT24 {
            return Err(TransactionBuilderError::Configuration(format!(
                "fee tier {} does not fit in uint24",
                fee
            )));
        }
        Ok(Self {
            fee,
            ..Self::default()
        })
    }

    /// Fixed gas price for every request (offline bundles)
    pub fn with_gas_price(mut self, gas_price: Option<u128>) -> Self {
        self.base_overrides.gas_price = gas_price;
        self
    }

    /// Fixed gas price for swap-queue requests, in every mode
    pub fn with_swap_gas_price(mut self, gas_price: Option<u128>) -> Self {
        self.swap_gas_price = gas_price;
        self
    }

    /// Fixed gas limit for liquidity mints
    pub fn with_liquidity_gas_limit(mut self, gas_limit: Option<u64>) -> Self {
        self.liquidity_gas_limit = gas_limit;
        self
    }

    pub fn fee(&self) -> u32 {
        self.fee
    }

    fn request(
        &self,
        kind: OperationKind,
        sender: &Identity,
        target: Address,
        call: OperationCall,
    ) -> OperationRequest {
        let mut overrides = self.base_overrides;
        match kind {
            OperationKind::SwapQueue => {
                overrides.gas_price = self.swap_gas_price.or(overrides.gas_price);
            }
            OperationKind::LiquidityMint => overrides.gas_limit = self.liquidity_gas_limit,
            _ => {}
        }
        OperationRequest {
            kind,
            target,
            call,
            origin_slot: sender.slot(),
            sender: sender.address(),
            overrides,
        }
    }

    /// Mint `amount` of `token` to `to`; `funder` signs
    pub fn mint(
        &self,
        funder: &Identity,
        token: &TokenHandle,
        to: Address,
        amount: U256,
    ) -> BuildResult<OperationRequest> {
        nonzero_address(OperationKind::Mint, "to", to)?;
        Ok(self.request(
            OperationKind::Mint,
            funder,
            token.address,
            OperationCall::Mint(MintParams { to, amount }),
        ))
    }

    pub fn transfer(
        &self,
        sender: &Identity,
        token: &TokenHandle,
        to: Address,
        amount: U256,
    ) -> BuildResult<OperationRequest> {
        nonzero_address(OperationKind::Transfer, "to", to)?;
        Ok(self.request(
            OperationKind::Transfer,
            sender,
            token.address,
            OperationCall::Transfer(TransferParams { to, amount }),
        ))
    }

    /// `owner` approves `spender` on `token`
    pub fn approve(
        &self,
        owner: &Identity,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> BuildResult<OperationRequest> {
        nonzero_address(OperationKind::Approve, "spender", spender)?;
        Ok(self.request(
            OperationKind::Approve,
            owner,
            token,
            OperationCall::Approve(ApproveParams { spender, amount }),
        ))
    }

    /// `spender` pulls `amount` from `from` to `to`
    pub fn transfer_from(
        &self,
        spender: &Identity,
        token: &TokenHandle,
        from: Address,
        to: Address,
        amount: U256,
    ) -> BuildResult<OperationRequest> {
        nonzero_address(OperationKind::TransferFrom, "from", from)?;
        nonzero_address(OperationKind::TransferFrom, "to", to)?;
        Ok(self.request(
            OperationKind::TransferFrom,
            spender,
            token.address,
            OperationCall::TransferFrom(TransferFromParams { from, to, amount }),
        ))
    }

    /// Uniform token-workload step for a participant pair
    ///
    /// `actor` is the pair's first participant and `peer` the second; `funder`
    /// signs mints. The role of each follows the token workload:
    /// mint to actor, actor → peer transfer, peer approves actor, actor pulls
    /// from peer.
    pub fn token_op(
        &self,
        kind: OperationKind,
        funder: &Identity,
        actor: &Identity,
        peer: &Identity,
        token: &TokenHandle,
        amount: U256,
    ) -> BuildResult<OperationRequest> {
        match kind {
            OperationKind::Mint => self.mint(funder, token, actor.address(), amount),
            OperationKind::Transfer => self.transfer(actor, token, peer.address(), amount),
            OperationKind::Approve => self.approve(peer, token.address, actor.address(), amount),
            OperationKind::TransferFrom => {
                self.transfer_from(actor, token, peer.address(), actor.address(), amount)
            }
            other => Err(TransactionBuilderError::invalid(
                other.as_str(),
                "not a token workload operation",
            )),
        }
    }

    /// Queue a swap of `amount_in` of `token_in` for `token_out`
    pub fn swap(
        &self,
        sender: &Identity,
        engine: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        now: u64,
    ) -> BuildResult<OperationRequest> {
        let kind = OperationKind::SwapQueue;
        nonzero_address(kind, "netting engine", engine)?;
        if token_in == token_out {
            return Err(TransactionBuilderError::invalid(
                kind.as_str(),
                "token_in and token_out are the same token",
            ));
        }
        if amount_in.is_zero() {
            return Err(TransactionBuilderError::invalid(kind.as_str(), "amount_in is zero"));
        }
        let params = SwapParams {
            token_in,
            token_out,
            fee: self.fee,
            recipient: sender.address(),
            deadline: now.saturating_add(SWAP_DEADLINE_SECS),
            amount_in,
            amount_out_minimum: U256::ZERO,
            sqrt_price_limit_x96: U160::ZERO,
        };
        Ok(self.request(kind, sender, engine, OperationCall::SwapQueue(params)))
    }

    /// Add full-range liquidity for a canonical pair
    pub fn add_liquidity(
        &self,
        sender: &Identity,
        position_manager: Address,
        amounts: &SplitAmounts,
        now: u64,
    ) -> BuildResult<OperationRequest> {
        self.add_liquidity_in_range(sender, position_manager, amounts, MIN_TICK, MAX_TICK, now)
    }

    pub fn add_liquidity_in_range(
        &self,
        sender: &Identity,
        position_manager: Address,
        amounts: &SplitAmounts,
        tick_lower: i32,
        tick_upper: i32,
        now: u64,
    ) -> BuildResult<OperationRequest> {
        let kind = OperationKind::LiquidityMint;
        nonzero_address(kind, "position manager", position_manager)?;
        if !(MIN_TICK..=MAX_TICK).contains(&tick_lower) || !(MIN_TICK..=MAX_TICK).contains(&tick_upper)
        {
            return Err(TransactionBuilderError::invalid(
                kind.as_str(),
                format!("ticks must lie within [{}, {}]", MIN_TICK, MAX_TICK),
            ));
        }
        let params = LiquidityParams {
            token0: amounts.token0,
            token1: amounts.token1,
            fee: self.fee,
            tick_lower,
            tick_upper,
            amount0_desired: amounts.amount0,
            amount1_desired: amounts.amount1,
            amount0_min: U256::ZERO,
            amount1_min: U256::ZERO,
            recipient: sender.address(),
            deadline: now.saturating_add(LIQUIDITY_DEADLINE_SECS),
        };
        params.validate()?;
        Ok(self.request(
            kind,
            sender,
            position_manager,
            OperationCall::LiquidityMint(params),
        ))
    }
}

fn nonzero_address(kind: OperationKind, field: &str, address: Address) -> BuildResult<()> {
    if address.is_zero() {
        return Err(TransactionBuilderError::invalid(
            kind.as_str(),
            format!("{} is the zero address", field),
        ));
    }
    Ok(())
}
