//! Integration tests for receipt classification and event extraction
//!
//! Receipts here are shaped the way the RPC client builds them: event names
//! resolved from topic0, payload kept raw.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{SolEvent, SolValue};
use txbench::contracts::{event_name, pool_address_from_event, IUniswapV3Factory};
use txbench::receipts::{classify, extract_event, Outcome, RawReceipt, ReceiptEvent};

fn pool_created_receipt(status: u64, pool: Address) -> RawReceipt {
    let topic = IUniswapV3Factory::PoolCreated::SIGNATURE_HASH;
    // Non-indexed payload: (int24 tickSpacing, address pool)
    let data = (60i32, pool).abi_encode();
    RawReceipt {
        status: Some(status),
        block_number: Some(7),
        tx_hash: Some(B256::repeat_byte(1)),
        events: vec![ReceiptEvent {
            name: event_name(&topic).map(str::to_string),
            address: Address::repeat_byte(0xfa),
            data: Bytes::from(data),
        }],
    }
}

#[test]
fn test_pool_created_flow() {
    let pool = Address::repeat_byte(0xab);
    let receipt = pool_created_receipt(1, pool);

    assert_eq!(classify(&receipt), Outcome::Success { ordinal: Some(7) });
    let data = extract_event(&receipt, "PoolCreated");
    assert_eq!(pool_address_from_event(&data), Some(pool));
}

#[test]
fn test_reverted_receipt_hides_events() {
    let receipt = pool_created_receipt(0, Address::repeat_byte(0xab));
    let outcome = classify(&receipt);
    assert!(!outcome.succeeded());
    assert_eq!(outcome.ordinal(), Some(7));
    assert!(extract_event(&receipt, "PoolCreated").is_empty());
}

#[test]
fn test_missing_event_is_empty_not_error() {
    let receipt = pool_created_receipt(1, Address::repeat_byte(0xab));
    assert!(extract_event(&receipt, "Transfer").is_empty());
    assert_eq!(pool_address_from_event(&[]), None);
}

#[test]
fn test_outcome_serializes_for_reports() {
    let outcome = classify(&RawReceipt::with_status(1, 42));
    let json = serde_json::to_string(&outcome).unwrap();
    assert!(json.contains("42"));
    assert_eq!(outcome.to_string(), "Tx Status:1 Height:42");
}
