//! Token pair canonicalization and proportional amount splitting
//!
//! Pools order their tokens by address, so every amount handed to a pool-side
//! call must follow the canonical `(token0, token1)` order. The split rule is
//! address-ordered: the lower-addressed token of a pair receives
//! `nominal / price` and the higher-addressed token receives `nominal`, no
//! matter which order the caller declared the pair in.
//!
//! Division is `U256` floor division (truncation toward zero), the same
//! rounding the contracts apply to unsigned integers.

use alloy_primitives::{Address, U256};

/// A token pair in canonical order with amounts permuted to match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitAmounts {
    pub token0: Address,
    pub token1: Address,
    pub amount0: U256,
    pub amount1: U256,
}

/// Two distinct tokens ordered so that `token0 < token1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderedPair {
    token0: Address,
    token1: Address,
}

impl OrderedPair {
    /// Canonicalize `(a, b)`; returns `None` when both are the same token
    pub fn new(a: Address, b: Address) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { token0: a, token1: b }),
            std::cmp::Ordering::Greater => Some(Self { token0: b, token1: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    /// Whether `token` was declared in the token0 slot
    pub fn is_token0(&self, token: Address) -> bool {
        self.token0 == token
    }
}

/// Amounts for `(token_a, token_b)` in declaration order
///
/// If `token_a` is the lower address it receives `nominal / price` and
/// `token_b` receives `nominal`; otherwise the two are swapped.
pub fn mint_amounts(token_a: Address, token_b: Address, nominal: U256, price: U256) -> (U256, U256) {
    let divided = nominal / price;
    match OrderedPair::new(token_a, token_b) {
        Some(pair) if pair.is_token0(token_a) => (divided, nominal),
        _ => (nominal, divided),
    }
}

/// Canonicalize `(token_a, token_b)` and split `nominal` by `price`
///
/// `price` must be non-zero; configuration validation guarantees it.
pub fn split(token_a: Address, token_b: Address, nominal: U256, price: U256) -> SplitAmounts {
    let (token0, token1) = match OrderedPair::new(token_a, token_b) {
        Some(pair) => (pair.token0(), pair.token1()),
        // Same token twice: nothing to reorder
        None => (token_a, token_b),
    };
    SplitAmounts {
        token0,
        token1,
        amount0: nominal / price,
        amount1: nominal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use proptest::prelude::*;

    const LOW: Address = address!("1000000000000000000000000000000000000001");
    const HIGH: Address = address!("f000000000000000000000000000000000000002");

    fn u(x: u64) -> U256 {
        U256::from(x)
    }

    #[test]
    fn test_low_token_absorbs_divide() {
        assert_eq!(mint_amounts(LOW, HIGH, u(100), u(4)), (u(25), u(100)));
        assert_eq!(mint_amounts(HIGH, LOW, u(100), u(4)), (u(100), u(25)));
    }

    #[test]
    fn test_split_is_declaration_order_independent() {
        let forward = split(LOW, HIGH, u(100), u(4));
        let backward = split(HIGH, LOW, u(100), u(4));
        assert_eq!(forward, backward);
        assert_eq!(forward.token0, LOW);
        assert_eq!(forward.amount0, u(25));
        assert_eq!(forward.amount1, u(100));
    }

    #[test]
    fn test_floor_division() {
        let split = split(LOW, HIGH, u(10), u(4));
        assert_eq!(split.amount0, u(2));
        assert_eq!(split.amount1, u(10));

        let split = super::split(LOW, HIGH, u(3), u(4));
        assert_eq!(split.amount0, U256::ZERO);
    }

    #[test]
    fn test_mixed_case_addresses_compare_as_bytes() {
        let upper: Address = "0xABCDEF0000000000000000000000000000000000".parse().unwrap();
        let lower: Address = "0x0bcdef0000000000000000000000000000000000".parse().unwrap();
        let pair = OrderedPair::new(upper, lower).unwrap();
        assert_eq!(pair.token0(), lower);
        assert!(pair.is_token0(lower));
    }

    #[test]
    fn test_ordered_pair_rejects_identical_tokens() {
        assert!(OrderedPair::new(LOW, LOW).is_none());
        // split still answers for a degenerate pair
        let same = split(LOW, LOW, u(100), u(4));
        assert_eq!((same.token0, same.token1), (LOW, LOW));
        assert_eq!((same.amount0, same.amount1), (u(25), u(100)));
    }

    #[test]
    fn test_split_follows_ordered_pair() {
        let upper: Address = "0xABCDEF0000000000000000000000000000000000".parse().unwrap();
        let lower: Address = "0x0bcdef0000000000000000000000000000000000".parse().unwrap();
        let pair = OrderedPair::new(upper, lower).unwrap();
        let s = split(upper, lower, u(8), u(4));
        assert_eq!((s.token0, s.token1), (pair.token0(), pair.token1()));
        assert_eq!(mint_amounts(upper, lower, u(8), u(4)), (u(8), u(2)));
    }

    fn any_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }

    proptest! {
        #[test]
        fn prop_split_symmetric(a in any_address(), b in any_address(), n in 1u128.., p in 1u64..1_000_000) {
            prop_assume!(a != b);
            let n = U256::from(n);
            let p = U256::from(p);
            let forward = split(a, b, n, p);
            let backward = split(b, a, n, p);
            prop_assert_eq!(forward, backward);
            prop_assert!(forward.token0 < forward.token1);
        }

        #[test]
        fn prop_split_remainder_bound(a in any_address(), b in any_address(), n in 1u128.., p in 1u64..1_000_000) {
            prop_assume!(a != b);
            let n = U256::from(n);
            let p = U256::from(p);
            let s = split(a, b, n, p);
            // amount0 = floor(amount1 / p): scaling back loses less than p
            prop_assert!(s.amount0 * p <= s.amount1);
            prop_assert!(s.amount1 - s.amount0 * p < p);
        }

        #[test]
        fn prop_split_idempotent(a in any_address(), b in any_address(), n in any::<u64>(), p in 1u64..) {
            let n = U256::from(n);
            let p = U256::from(p);
            prop_assert_eq!(split(a, b, n, p), split(a, b, n, p));
        }
    }
}
