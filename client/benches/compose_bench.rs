// Composition benchmarks.
//
// Covers ABI binding, transaction serialization and hashing, and the full
// compose-sign-broadcast path against the in-memory chain.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use quill_client::compose::{ComposeOptions, Composer, StaticKeys};
use quill_client::crypto::PrivateKey;
use quill_client::transaction::{
    ActionArgs, ActionDef, Authorization, ContractAbi, Message, TransactionBuilder,
    TransactionHeader,
};
use quill_client::MemoryChain;

fn transfer_abi() -> ContractAbi {
    ContractAbi::new(vec![ActionDef::new(
        "transfer",
        [
            ("from", "account_name"),
            ("to", "account_name"),
            ("amount", "uint64"),
            ("memo", "string"),
        ],
    )])
}

fn bench_abi_bind(c: &mut Criterion) {
    let abi = transfer_abi();
    let action = abi.action("transfer").cloned().unwrap();

    c.bench_function("abi/bind_positional", |b| {
        b.iter(|| {
            action
                .bind(ActionArgs::from(json!(["inita", "initb", 1, "memo"])))
                .unwrap()
        });
    });
}

fn bench_signable_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/signable_bytes");

    for size in [1, 10, 100] {
        let messages: Vec<Message> = (0..size)
            .map(|i| {
                Message::new(
                    "eos",
                    "transfer",
                    json!({"from": "inita", "to": "initb", "amount": i, "memo": ""}),
                    vec![Authorization::new("inita", "active")],
                )
            })
            .collect();
        let tx = TransactionBuilder::new(TransactionHeader::local(60))
            .messages(messages)
            .build();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tx, |b, tx| {
            b.iter(|| tx.id());
        });
    }

    group.finish();
}

fn bench_compose_and_sign(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let key = PrivateKey::from_seed(&[0xa1; 32]);
    let chain = Arc::new(MemoryChain::new().with_account("inita", key.public_key()));
    let composer = Composer::builder(chain)
        .abi("eos", transfer_abi())
        .key_provider(StaticKeys::new(key.to_encoded()))
        .build();

    c.bench_function("compose/transfer_sign_only", |b| {
        b.to_async(&runtime).iter(|| async {
            composer
                .action(
                    "transfer",
                    json!(["inita", "initb", 1, "bench"]),
                    ComposeOptions::default().with_broadcast(false),
                )
                .await
                .unwrap()
        });
    });

    c.bench_function("compose/transfer_broadcast", |b| {
        b.to_async(&runtime).iter(|| async {
            composer
                .action("transfer", json!(["inita", "initb", 1, "bench"]), true)
                .await
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_abi_bind,
    bench_signable_bytes,
    bench_compose_and_sign
);
criterion_main!(benches);
