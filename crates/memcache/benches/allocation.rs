// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the allocate / free hot path.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use memcache::MemCache;

fn cache_with_user() -> MemCache {
    let mut mc = MemCache::new();
    mc.add_user("benchusr", usize::MAX / 2).unwrap();
    mc
}

fn bench_cached_reuse(c: &mut Criterion) {
    let mut mc = cache_with_user();
    c.bench_function("allocate_free_cached_64b", |b| {
        b.iter(|| {
            let block = mc.allocate("benchusr", black_box(64)).unwrap();
            mc.free("benchusr", block).unwrap();
        })
    });
}

fn bench_uncached(c: &mut Criterion) {
    let mut mc = cache_with_user();
    c.bench_function("allocate_free_released_4k", |b| {
        b.iter(|| {
            let block = mc.allocate("benchusr", black_box(4096)).unwrap();
            mc.free("benchusr", block).unwrap();
        })
    });
}

fn bench_group_free(c: &mut Criterion) {
    c.bench_function("group_free_1000_blocks", |b| {
        b.iter_batched(
            || {
                let mut mc = cache_with_user();
                mc.add_user("trusted0", 1).unwrap();
                mc.trust("benchusr", "trusted0").unwrap();
                let blocks: Vec<_> = (1..=1000)
                    .map(|i| {
                        let block = mc.allocate("benchusr", i % 256 + 1).unwrap();
                        mc.set_block_mode("benchusr", block, 'G').unwrap();
                        block
                    })
                    .collect();
                (mc, blocks)
            },
            |(mut mc, blocks)| {
                for block in blocks {
                    mc.free("trusted0", block).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_cached_reuse, bench_uncached, bench_group_free);
criterion_main!(benches);
