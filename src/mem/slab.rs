// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Reference [`Allocator`] implementation: a lock-free, size-classed block
//! allocator.
//!
//! O(1) allocation from size-class pools using atomic bitmaps, one bitmap
//! CAS per reserve/release. Keys and values live in separate pool sets so
//! their block-id spaces (1..=65535 and 1..=511 respectively) never collide.
//!
//! # Performance
//!
//! - `allocate_slice`: single CAS in the common case.
//! - `release_slice` on a key slice: deferred past the current epoch so a
//!   concurrent reader resolving a shared key slice during rebalance never
//!   observes a reused slot.

use crate::collaborators::{AllocatedSlice, Allocator, SliceKind};
use crate::config::{INVALID_BLOCK_ID, MAX_KEY_BLOCK_ID, MAX_VALUE_BLOCK_ID};
use crate::error::ChunkError;
use crossbeam::epoch;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Size-class configuration: (slot_size, slots_per_pool). Each pool backs a
/// 64-bit bitmap, so `slots_per_pool` must not exceed 64.
const SIZE_CLASSES: &[(usize, usize)] = &[
    (16, 64),
    (32, 64),
    (64, 64),
    (128, 64),
    (256, 64),
    (512, 64),
    (1024, 64),
    (4096, 64),
    (16384, 64),
    (65536, 64),
];

/// Per-pool state with an atomic bitmap for free-slot tracking.
struct Pool {
    data: UnsafeCell<Vec<u8>>,
    bitmap: AtomicU64,
    slot_size: usize,
    slot_count: usize,
}

// SAFETY: Pool is Send + Sync because all access to `data` is gated by a
// successful bitmap CAS, which hands out exclusive ownership of exactly one
// slot's byte range to exactly one caller at a time.
unsafe impl Send for Pool {}
unsafe impl Sync for Pool {}

impl Pool {
    fn new(slot_size: usize, slot_count: usize) -> Self {
        assert!(slot_count <= 64, "pool bitmap is 64 bits wide");
        Self {
            data: UnsafeCell::new(vec![0u8; slot_size * slot_count]),
            bitmap: AtomicU64::new(0),
            slot_size,
            slot_count,
        }
    }

    /// Claim the first free slot. Returns its index, or `None` if full.
    fn try_reserve(&self) -> Option<usize> {
        loop {
            let bitmap = self.bitmap.load(Ordering::Acquire);
            let slot_index = (!bitmap).trailing_zeros() as usize;
            if slot_index >= self.slot_count {
                return None;
            }
            let new_bitmap = bitmap | (1u64 << slot_index);
            if self
                .bitmap
                .compare_exchange(bitmap, new_bitmap, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return Some(slot_index);
            }
        }
    }

    fn release_slot(&self, slot_index: usize) {
        debug_assert!(slot_index < self.slot_count, "invalid slot index");
        let slot_mask = 1u64 << slot_index;
        loop {
            let bitmap = self.bitmap.load(Ordering::Acquire);
            let new_bitmap = bitmap & !slot_mask;
            if self
                .bitmap
                .compare_exchange(bitmap, new_bitmap, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }

    /// # Safety
    /// The caller must hold exclusive access to `slot_index` (established by
    /// a successful `try_reserve`, or by the allocator's own release path).
    #[allow(clippy::mut_from_ref)]
    unsafe fn slice_mut(&self, slot_index: usize) -> &mut [u8] {
        let offset = slot_index * self.slot_size;
        let data = &mut *self.data.get();
        &mut data[offset..offset + self.slot_size]
    }

    fn slice(&self, slot_index: usize) -> &[u8] {
        let offset = slot_index * self.slot_size;
        // SAFETY: readers only ever see slots another caller already
        // published a reference to; the allocator never shrinks `data`.
        let data = unsafe { &*self.data.get() };
        &data[offset..offset + self.slot_size]
    }
}

struct Inner {
    key_pools: Vec<Pool>,
    value_pools: Vec<Pool>,
}

/// Lock-free, size-classed block allocator implementing [`Allocator`].
///
/// Keys and values are tracked in independent pool sets so a value's block
/// id (`<= 511`) and a key's block id (`<= 65535`) are never the same
/// allocation. Cloning a `BlockAllocator` clones the handle, not the
/// backing pools — every clone resolves the same blocks, the way a map's
/// chunks share one allocator (grounded on `Arc<SlabPool>` being handed to
/// every consumer of the teacher's global slab pool).
#[derive(Clone)]
pub struct BlockAllocator(Arc<Inner>);

impl BlockAllocator {
    /// Build a new allocator from the default size-class table.
    pub fn new() -> Self {
        let build = || SIZE_CLASSES.iter().map(|&(s, c)| Pool::new(s, c)).collect();
        let key_pools: Vec<Pool> = build();
        let value_pools: Vec<Pool> = build();
        assert!(key_pools.len() as u32 - 1 <= MAX_KEY_BLOCK_ID);
        assert!((value_pools.len() as u32) - 1 <= MAX_VALUE_BLOCK_ID);
        Self(Arc::new(Inner {
            key_pools,
            value_pools,
        }))
    }

    fn pools(&self, kind: SliceKind) -> &[Pool] {
        match kind {
            SliceKind::Key => &self.0.key_pools,
            SliceKind::Value => &self.0.value_pools,
        }
    }
}

impl Default for BlockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for BlockAllocator {
    fn allocate_slice(&self, size: usize, kind: SliceKind) -> crate::error::Result<AllocatedSlice> {
        let pools = self.pools(kind);
        let start = pools
            .iter()
            .position(|p| p.slot_size >= size)
            .ok_or_else(|| ChunkError::AllocationFailed(format!("no size class fits {size} bytes")))?;

        for (pool_idx, pool) in pools.iter().enumerate().skip(start) {
            if let Some(slot_index) = pool.try_reserve() {
                // block 0 is reserved as INVALID_BLOCK_ID, so pool indices
                // are offset by one.
                let block = pool_idx as u32 + 1;
                let position = (slot_index * pool.slot_size) as u32;
                return Ok(AllocatedSlice {
                    block,
                    position,
                    length: size as u32,
                });
            }
        }
        Err(ChunkError::AllocationFailed(format!(
            "all pools exhausted for {size} byte {kind:?} slice"
        )))
    }

    fn release_slice(&self, slice: AllocatedSlice, kind: SliceKind) {
        if slice.block == INVALID_BLOCK_ID {
            return;
        }
        let pool_idx = (slice.block - 1) as usize;
        let slot_index = {
            let pool = &self.pools(kind)[pool_idx];
            slice.position as usize / pool.slot_size
        };
        match kind {
            // Key slices may still be resolved by a concurrent rebalance
            // reader that shares this slot; defer the bitmap clear past the
            // current epoch so no reader can be racing a reused slot.
            SliceKind::Key => {
                let this = self.clone();
                let guard = epoch::pin();
                guard.defer(move || {
                    this.pools(kind)[pool_idx].release_slot(slot_index);
                });
            }
            SliceKind::Value => {
                self.pools(kind)[pool_idx].release_slot(slot_index);
            }
        }
    }

    fn resolve(&self, block: u32, position: u32, length: u32, kind: SliceKind) -> &[u8] {
        debug_assert_ne!(block, INVALID_BLOCK_ID, "cannot resolve the invalid block id");
        let pool = &self.pools(kind)[(block - 1) as usize];
        &pool.slice(position as usize / pool.slot_size)[..length as usize]
    }

    fn resolve_mut(&self, block: u32, position: u32, length: u32, kind: SliceKind) -> &mut [u8] {
        debug_assert_ne!(block, INVALID_BLOCK_ID, "cannot resolve the invalid block id");
        let pool = &self.pools(kind)[(block - 1) as usize];
        let slot_index = position as usize / pool.slot_size;
        // SAFETY: the caller holds the `AllocatedSlice` returned by
        // `allocate_slice`, which is this allocator's proof of exclusive
        // ownership of the slot until `release_slice` is called.
        &mut unsafe { pool.slice_mut(slot_index) }[..length as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_picks_smallest_fitting_class() {
        let alloc = BlockAllocator::new();
        let slice = alloc.allocate_slice(10, SliceKind::Key).unwrap();
        assert_eq!(slice.block, 1); // first pool (16B), offset by INVALID_BLOCK_ID
        assert_eq!(slice.length, 10);
    }

    #[test]
    fn allocate_and_resolve_round_trips_bytes() {
        let alloc = BlockAllocator::new();
        let slice = alloc.allocate_slice(5, SliceKind::Value).unwrap();
        {
            let buf = alloc.resolve_mut(slice.block, slice.position, slice.length, SliceKind::Value);
            buf.copy_from_slice(b"hello");
        }
        assert_eq!(
            alloc.resolve(slice.block, slice.position, slice.length, SliceKind::Value),
            b"hello"
        );
    }

    #[test]
    fn release_then_reallocate_reuses_slot() {
        let alloc = BlockAllocator::new();
        let a = alloc.allocate_slice(16, SliceKind::Value).unwrap();
        alloc.release_slice(a, SliceKind::Value);
        let b = alloc.allocate_slice(16, SliceKind::Value).unwrap();
        assert_eq!(a.block, b.block);
        assert_eq!(a.position, b.position);
    }

    #[test]
    fn key_and_value_block_ids_are_independent_spaces() {
        let alloc = BlockAllocator::new();
        let k = alloc.allocate_slice(16, SliceKind::Key).unwrap();
        let v = alloc.allocate_slice(16, SliceKind::Value).unwrap();
        assert_eq!(k.block, v.block); // same pool index, different spaces
    }

    #[test]
    fn pool_exhaustion_surfaces_as_allocation_failed() {
        let alloc = BlockAllocator::new();
        let mut slices = Vec::new();
        for _ in 0..64 {
            slices.push(alloc.allocate_slice(16, SliceKind::Value).unwrap());
        }
        let err = alloc.allocate_slice(16, SliceKind::Value).unwrap_err();
        assert!(matches!(err, ChunkError::AllocationFailed(_)));
    }
}
