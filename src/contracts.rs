//! ABI bindings for the contracts driven by the benchmark
//!
//! Only the call and event surface the workloads touch is bound here. Contract
//! semantics live on chain; these types exist to produce calldata and to name
//! the events found in receipts.

use alloy_primitives::{Address, B256};
use alloy_sol_types::{sol, SolEvent};

sol! {
    /// Mintable ERC-20 token used by every workload.
    interface IToken {
        function mint(address to, uint256 amount) external;
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external returns (uint256);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event BalanceQuery(uint256 value);
    }

    struct ExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        uint24 fee;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
        uint160 sqrtPriceLimitX96;
    }

    /// Netting engine: queues swap requests for deferred settlement.
    interface INettingEngine {
        function queueSwapRequest(ExactInputSingleParams calldata params) external;
    }

    struct PositionMintParams {
        address token0;
        address token1;
        uint24 fee;
        int24 tickLower;
        int24 tickUpper;
        uint256 amount0Desired;
        uint256 amount1Desired;
        uint256 amount0Min;
        uint256 amount1Min;
        address recipient;
        uint256 deadline;
    }

    interface INonfungiblePositionManager {
        function mint(PositionMintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
    }

    interface IUniswapV3Factory {
        event PoolCreated(address indexed token0, address indexed token1, uint24 indexed fee, int24 tickSpacing, address pool);
    }
}

const ADDRESS_LEN: usize = 20;

/// Resolve a log's first topic to the name of a bound event.
pub fn event_name(topic0: &B256) -> Option<&'static str> {
    match *topic0 {
        t if t == IToken::Transfer::SIGNATURE_HASH => Some("Transfer"),
        t if t == IToken::Approval::SIGNATURE_HASH => Some("Approval"),
        t if t == IToken::BalanceQuery::SIGNATURE_HASH => Some("BalanceQuery"),
        t if t == IUniswapV3Factory::PoolCreated::SIGNATURE_HASH => Some("PoolCreated"),
        _ => None,
    }
}

/// The pool address carried in the tail of a `PoolCreated` payload.
///
/// The payload ends with the ABI word holding the pool address, so the last
/// 20 bytes are the address. Shorter payloads yield `None`.
pub fn pool_address_from_event(data: &[u8]) -> Option<Address> {
    if data.len() < ADDRESS_LEN {
        return None;
    }
    Some(Address::from_slice(&data[data.len() - ADDRESS_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};
    use alloy_sol_types::SolValue;

    #[test]
    fn test_event_name_lookup() {
        assert_eq!(event_name(&IToken::Transfer::SIGNATURE_HASH), Some("Transfer"));
        assert_eq!(
            event_name(&IUniswapV3Factory::PoolCreated::SIGNATURE_HASH),
            Some("PoolCreated")
        );
        assert_eq!(event_name(&B256::ZERO), None);
    }

    #[test]
    fn test_pool_address_from_event() {
        let pool = address!("1111111111111111111111111111111111111111");
        let data = (U256::from(60u64), pool).abi_encode();
        assert_eq!(pool_address_from_event(&data), Some(pool));

        assert_eq!(pool_address_from_event(&[0u8; 4]), None);
    }
}
