//! Benchmarks for the offline hot path
//!
//! Benchmarks:
//! - Amount splitting
//! - Request construction and calldata encoding
//! - Populate + sign + encode through the nonce ledger
//!
//! Note: signing is async; each iteration blocks on a shared runtime.

use alloy_primitives::{Address, U256};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use txbench::nonce_manager::NonceLedger;
use txbench::test_utils::{MockChainClient, DEV_KEYS};
use txbench::tx_builder::{split, OfflineSigner, RequestBuilder};
use txbench::types::TokenHandle;
use txbench::wallet::IdentitySet;

fn bench_split(c: &mut Criterion) {
    let a = Address::repeat_byte(0x20);
    let b = Address::repeat_byte(0x10);
    let nominal = U256::from(3_000_000_000_000_000_000u128);
    let price = U256::from(4u8);

    c.bench_function("split", |bench| {
        bench.iter(|| split(black_box(a), black_box(b), black_box(nominal), black_box(price)))
    });
}

fn bench_calldata(c: &mut Criterion) {
    let ids = IdentitySet::from_keys(&DEV_KEYS).unwrap();
    let builder = RequestBuilder::default();
    let engine = Address::repeat_byte(0xee);

    c.bench_function("swap_calldata", |bench| {
        bench.iter(|| {
            let request = builder
                .swap(
                    ids.funding(),
                    engine,
                    Address::repeat_byte(1),
                    Address::repeat_byte(2),
                    U256::from(1_000u64),
                    1_700_000_000,
                )
                .unwrap();
            black_box(request.calldata())
        })
    });
}

fn bench_sign_offline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ids = IdentitySet::from_keys(&DEV_KEYS).unwrap();
    let token = TokenHandle::new(0, Address::repeat_byte(0x42));

    let mut group = c.benchmark_group("sign_offline");
    for gas_price in [None, Some(255u128)] {
        let label = if gas_price.is_some() { "fixed_gas_price" } else { "queried_gas_price" };
        let signer = OfflineSigner::new(Arc::new(MockChainClient::new()), Arc::new(NonceLedger::new()));
        let builder = RequestBuilder::default().with_gas_price(gas_price);
        let sender = ids.get(1).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(label), &gas_price, |bench, _| {
            bench.iter(|| {
                let request = builder
                    .transfer(sender, &token, Address::repeat_byte(7), U256::from(1u64))
                    .unwrap();
                rt.block_on(signer.sign_offline(sender, &request)).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_split, bench_calldata, bench_sign_offline);
criterion_main!(benches);
