//! Gateway Hot-Path Benchmarks
//!
//! Benchmarks the pure domain functions that run on every request:
//! chain filtering, amount formatting and approval message rendering.
//!
//! Run with: cargo bench --bench gateway_bench

use std::collections::BTreeSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chain_gateway::domain::amount::FixedAmount;
use chain_gateway::domain::chain::{Chain, ChainMap, Compatibility, Location};
use chain_gateway::domain::fee::ApprovalTerms;
use chain_gateway::domain::filter::{ChainFilter, ChainFilterConfig, FilterMode, LocationFilter};
use chain_gateway::domain::request::TransactionRequest;

fn chain_map(n: usize) -> ChainMap {
    (0..n)
        .map(|i| {
            let code = format!("C{i}");
            let chain = Chain {
                code: code.clone(),
                name: code.clone(),
                compatibility: Compatibility::Evm,
                decimals: 18,
                rpc_urls: vec![],
                explorer: None,
                disabled: false,
                testnet: false,
                derivation_algorithm: None,
                is_evm: true,
                tokens: vec![],
                supported_locations: vec![Location::Origin, Location::Target],
            };
            (code, chain)
        })
        .collect()
}

/// Benchmark a whitelist lookup and a full supported-chain listing.
fn bench_chain_filter(c: &mut Criterion) {
    let map = chain_map(64);
    let whitelist: BTreeSet<String> = (0..64).step_by(2).map(|i| format!("C{i}")).collect();
    let config = ChainFilterConfig {
        origin: Some(LocationFilter {
            mode: FilterMode::Whitelist,
            chains: whitelist,
        }),
        target: None,
    };
    let filter = ChainFilter::new(&map, Location::Origin, &config);

    c.bench_function("filter_is_supported", |b| {
        b.iter(|| filter.is_supported_chain(black_box("C42")));
    });
    c.bench_function("filter_supported_codes_64", |b| {
        b.iter(|| filter.supported_codes().len());
    });
}

/// Benchmark integer-string parsing and decimal rendering.
fn bench_amount_format(c: &mut Criterion) {
    c.bench_function("amount_parse_and_format", |b| {
        b.iter(|| {
            FixedAmount::parse(black_box("123456789012345678"), black_box(18), "amount")
                .and_then(|a| a.to_decimal_string())
        });
    });
}

/// Benchmark approval message rendering.
fn bench_approval_message(c: &mut Criterion) {
    let request: TransactionRequest = serde_json::from_value(serde_json::json!({
        "originChain": "ETH", "originAddress": "0x1111111111111111111111111111111111111111",
        "originSymbol": "USDK", "targetChain": "POL",
        "targetAddress": "0x2222222222222222222222222222222222222222",
        "targetSymbol": "USDK", "amount": "100000000", "decimals": 6
    }))
    .expect("valid request fixture");

    c.bench_function("approval_message_render", |b| {
        b.iter(|| {
            ApprovalTerms::for_request(&request, 6, black_box("fee-1"), black_box("101500000"))
                .and_then(|t| t.message())
        });
    });
}

criterion_group!(
    benches,
    bench_chain_filter,
    bench_amount_format,
    bench_approval_message,
);
criterion_main!(benches);
