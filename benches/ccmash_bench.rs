use std::ops::ControlFlow;

use ccmash::{calc_dataset_item, Cache, FullContext, LightContext, StorageLocation};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ethereum_types::H256;

const CACHE_SIZE: u64 = 64 * 1021;
const FULL_SIZE: u64 = 128 * 8191;

fn bench_cache(c: &mut Criterion) {
    c.bench_function("cache_64k", |b| {
        b.iter(|| Cache::new(black_box(CACHE_SIZE), &H256::zero()).unwrap())
    });
}

fn bench_dataset_item(c: &mut Criterion) {
    let cache = Cache::new(CACHE_SIZE, &H256::zero()).unwrap();
    let mut i = 0u32;
    c.bench_function("dataset_item", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            calc_dataset_item(&cache, black_box(i))
        })
    });
}

fn bench_hashimoto(c: &mut Criterion) {
    let light = LightContext::new(CACHE_SIZE, H256::zero()).unwrap();
    let mut nonce = 0u64;
    c.bench_function("hashimoto_light", |b| {
        b.iter(|| {
            nonce += 1;
            light.compute(FULL_SIZE, &H256::zero(), black_box(nonce)).unwrap()
        })
    });

    let full = FullContext::new(
        StorageLocation::Memory,
        H256::zero(),
        FULL_SIZE,
        LightContext::new(CACHE_SIZE, H256::zero()).unwrap(),
        |_| ControlFlow::Continue(()),
    )
    .unwrap();
    c.bench_function("hashimoto_full", |b| {
        b.iter(|| {
            nonce += 1;
            full.compute(FULL_SIZE, &H256::zero(), black_box(nonce)).unwrap()
        })
    });
}

criterion_group!(benches, bench_cache, bench_dataset_item, bench_hashimoto);
criterion_main!(benches);
