// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use sorted_chunk::collaborators::{Allocator, SliceKind};
use sorted_chunk::mem::{BlockAllocator, BytesHeader, BytesSerializer, U64Comparator};
use sorted_chunk::reference::ValueReference;
use sorted_chunk::{Chunk, Op};

type BenchChunk = Chunk<u64, Vec<u8>, BlockAllocator, BytesSerializer, U64Comparator, BytesHeader>;

fn new_chunk(max_items: usize, alloc: BlockAllocator) -> BenchChunk {
    let chunk = Chunk::new(
        max_items,
        0u64.to_be_bytes().to_vec(),
        alloc,
        BytesSerializer,
        U64Comparator,
        None,
    );
    chunk.normalize();
    chunk
}

fn put(chunk: &BenchChunk, alloc: &BlockAllocator, key: u64) {
    let ei = chunk.allocate_entry_and_key(&key).unwrap();
    let slot = chunk.link_entry(ei, &key);
    let slice = alloc.allocate_slice(8, SliceKind::Value).unwrap();
    let value_ref = ValueReference::new(slice.block, slice.length, slice.position);
    chunk.point_to_value(Op::put_if_absent(slot, value_ref));
}

/// Benchmark: lookup into a chunk with a fully built sorted prefix.
/// Target: dominated by the binary search, no allocation.
fn bench_lookup_hit(c: &mut Criterion) {
    let alloc = BlockAllocator::new();
    let chunk = new_chunk(4096, alloc.clone());
    for k in 0..2048u64 {
        put(&chunk, &alloc, k);
    }

    c.bench_function("chunk_lookup_hit", |b| {
        let mut k = 0u64;
        b.iter(|| {
            let result = chunk.lookup(black_box(&(k % 2048)));
            k = k.wrapping_add(1);
            black_box(result)
        })
    });
}

/// Benchmark: lookup for an absent key, still walking into the tail.
fn bench_lookup_miss(c: &mut Criterion) {
    let alloc = BlockAllocator::new();
    let chunk = new_chunk(4096, alloc.clone());
    for k in 0..2048u64 {
        put(&chunk, &alloc, k * 2); // only even keys present
    }

    c.bench_function("chunk_lookup_miss", |b| {
        let mut k = 1u64;
        b.iter(|| {
            let result = chunk.lookup(black_box(&k));
            k = k.wrapping_add(2);
            black_box(result)
        })
    });
}

/// Benchmark: allocate_entry_and_key + link_entry for an ascending key
/// stream, the common append-mostly insert pattern.
fn bench_link_entry_ascending(c: &mut Criterion) {
    c.bench_function("chunk_link_entry_ascending", |b| {
        b.iter_batched(
            || {
                let alloc = BlockAllocator::new();
                (new_chunk(100_000, alloc.clone()), alloc, 0u64)
            },
            |(chunk, _alloc, mut next_key)| {
                for _ in 0..1000 {
                    let ei = chunk.allocate_entry_and_key(&next_key).unwrap();
                    black_box(chunk.link_entry(ei, &next_key));
                    next_key += 1;
                }
            },
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark: point_to_value attach via PutIfAbsent on a freshly linked slot.
fn bench_point_to_value_attach(c: &mut Criterion) {
    c.bench_function("chunk_point_to_value_attach", |b| {
        b.iter_batched(
            || {
                let alloc = BlockAllocator::new();
                let chunk = new_chunk(16, alloc.clone());
                let ei = chunk.allocate_entry_and_key(&1u64).unwrap();
                let slot = chunk.link_entry(ei, &1u64);
                let slice = alloc.allocate_slice(8, SliceKind::Value).unwrap();
                let value_ref = ValueReference::new(slice.block, slice.length, slice.position);
                (chunk, slot, value_ref)
            },
            |(chunk, slot, value_ref)| {
                black_box(chunk.point_to_value(Op::put_if_absent(slot, value_ref)));
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    chunk_benches,
    bench_lookup_hit,
    bench_lookup_miss,
    bench_link_entry_ascending,
    bench_point_to_value_attach,
);

criterion_main!(chunk_benches);
