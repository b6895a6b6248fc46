// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! The concurrent, lock-free ordered-map chunk.
//!
//! A `Chunk` owns a fixed-capacity array of [`EntrySlot`](crate::entry::EntrySlot)s
//! threaded into a sorted singly-linked list. Keys and values themselves live
//! in off-heap memory owned by an [`Allocator`](crate::collaborators::Allocator);
//! the chunk stores only packed references to them.
//!
//! Submodules implement the chunk's operations by topic; all of them `impl`
//! onto the same `Chunk<K, V, A, S, C, H>` type defined here.

mod insert;
mod iter;
mod lifecycle;
mod lookup;
mod rebalance;
mod stats;
mod value_ops;

pub use iter::{AscendingIter, DescendingIter};
pub use stats::Statistics;
pub use value_ops::{Op, OpKind};

use crate::collaborators::{Allocator, Comparator, Serializer, ValueHeader};
use crate::config::HEAD_SLOT;
use crate::entry::EntrySlot;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// The chunk's lifecycle state.
///
/// ```text
/// Infant --normalize--> Normal --freeze--> Frozen --release--> Released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    /// Just created by a split; still reachable only through its `creator`.
    Infant = 0,
    /// Externally visible and open for mutation.
    Normal = 1,
    /// A rebalance has started; no new mutation may begin.
    Frozen = 2,
    /// Drained of in-flight operations and readers; awaiting reclamation.
    Released = 3,
}

impl State {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Infant,
            1 => State::Normal,
            2 => State::Frozen,
            3 => State::Released,
            _ => unreachable!("invalid chunk state byte {v}"),
        }
    }
}

/// Sentinel meaning "no rebalancer engaged" / "no creator" / "no next chunk".
const NONE_TOKEN: u64 = 0;

/// Pack a next-chunk id and its deletion-mark bit into one `u64`.
pub(crate) fn pack_next(chunk_id: u64, marked: bool) -> u64 {
    (chunk_id << 1) | u64::from(marked)
}

/// Unpack a next-chunk token into `(chunk_id, marked)`. `chunk_id == 0` with
/// `marked == false` means "no next chunk".
pub(crate) fn unpack_next(token: u64) -> (u64, bool) {
    (token >> 1, token & 1 == 1)
}

/// A concurrent, lock-free ordered-map chunk.
///
/// Type parameters mirror the out-of-scope collaborators: `A` allocates and
/// resolves off-heap slices, `S` serializes values of type `V`, `C` orders
/// and serializes keys of type `K`, and `H` defines the in-place value-header
/// lock protocol. `K`/`V` never live inside the chunk itself — only their
/// serialized bytes do — so the struct only needs `PhantomData` for them.
pub struct Chunk<K, V, A, S, C, H> {
    entries: Box<[EntrySlot]>,
    entry_index: AtomicUsize,
    sorted_count: AtomicUsize,
    max_items: usize,
    state: AtomicU8,
    pending_ops: AtomicUsize,
    rebalancer: AtomicU64,
    creator: AtomicU64,
    next: AtomicU64,
    min_key: Box<[u8]>,
    allocator: A,
    serializer: S,
    comparator: C,
    stats: Statistics,
    _value: PhantomData<fn() -> V>,
    _key: PhantomData<fn() -> K>,
    _header: PhantomData<fn() -> H>,
}

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    /// Build a new chunk in the `Infant` state.
    ///
    /// `max_items` bounds the entry array (slot 0 is the head sentinel, so
    /// the array is allocated with `max_items + 1` slots). `min_key` is the
    /// serialized lower bound this chunk is responsible for; `creator` is
    /// the id of the chunk that split to produce this one, cleared by
    /// `normalize`.
    pub fn new(
        max_items: usize,
        min_key: Vec<u8>,
        allocator: A,
        serializer: S,
        comparator: C,
        creator: Option<u64>,
    ) -> Self {
        let mut entries = Vec::with_capacity(max_items + 1);
        entries.resize_with(max_items + 1, EntrySlot::new);
        Self {
            entries: entries.into_boxed_slice(),
            entry_index: AtomicUsize::new(1),
            sorted_count: AtomicUsize::new(0),
            max_items,
            state: AtomicU8::new(State::Infant as u8),
            pending_ops: AtomicUsize::new(0),
            rebalancer: AtomicU64::new(NONE_TOKEN),
            creator: AtomicU64::new(creator.unwrap_or(NONE_TOKEN)),
            next: AtomicU64::new(NONE_TOKEN),
            min_key: min_key.into_boxed_slice(),
            allocator,
            serializer,
            comparator,
            stats: Statistics::new(),
            _value: PhantomData,
            _key: PhantomData,
            _header: PhantomData,
        }
    }

    /// Maximum number of live entries this chunk can hold.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The creator chunk id, or `None` once `normalize` has cleared it.
    pub fn creator(&self) -> Option<u64> {
        match self.creator.load(Ordering::Acquire) {
            NONE_TOKEN => None,
            id => Some(id),
        }
    }

    /// Read-only access to this chunk's statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// The serialized lower bound key this chunk owns.
    pub fn read_min_key(&self) -> &[u8] {
        &self.min_key
    }

    /// The serialized key of the last live slot in the sorted prefix, or the
    /// min key if the chunk is empty. Used by the rebalancer to decide split
    /// boundaries.
    pub fn read_max_key(&self) -> &[u8] {
        let sorted_count = self.sorted_count.load(Ordering::Acquire);
        if sorted_count == 0 {
            return &self.min_key;
        }
        let key_ref = self.entries[sorted_count].key_ref();
        self.allocator.resolve(
            key_ref.block,
            key_ref.position,
            key_ref.length,
            crate::collaborators::SliceKind::Key,
        )
    }

    /// The physical slot index of the first entry reachable from the list
    /// head, or `HEAD_SLOT` if the chunk is empty. The rebalancer passes this
    /// as the starting `src_entry_idx` for the first call to
    /// `copy_part_no_keys` against a frozen chunk.
    pub fn head_next(&self) -> usize {
        self.head().next()
    }

    fn head(&self) -> &EntrySlot {
        &self.entries[HEAD_SLOT]
    }

    fn slot(&self, index: usize) -> &EntrySlot {
        &self.entries[index]
    }

    fn entry_index(&self) -> usize {
        self.entry_index.load(Ordering::Acquire)
    }

    fn sorted_count(&self) -> usize {
        self.sorted_count.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn allocator_for_test(&self) -> &A {
        &self.allocator
    }
}

/// Test-only convenience: a chunk wired up with the reference in-memory
/// collaborators (`u64` keys, `Vec<u8>` values), shared across every
/// submodule's unit tests.
#[cfg(test)]
pub(crate) fn test_chunk(
    max_items: usize,
) -> Chunk<
    u64,
    Vec<u8>,
    crate::mem::BlockAllocator,
    crate::mem::BytesSerializer,
    crate::mem::U64Comparator,
    crate::mem::BytesHeader,
> {
    Chunk::new(
        max_items,
        0u64.to_be_bytes().to_vec(),
        crate::mem::BlockAllocator::new(),
        crate::mem::BytesSerializer,
        crate::mem::U64Comparator,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{BlockAllocator, BytesHeader, BytesSerializer, U64Comparator};

    #[test]
    fn new_chunk_starts_infant_with_empty_prefix() {
        let chunk = test_chunk(8);
        assert_eq!(chunk.state(), State::Infant);
        assert_eq!(chunk.sorted_count(), 0);
        assert_eq!(chunk.entry_index(), 1);
        assert_eq!(chunk.max_items(), 8);
    }

    #[test]
    fn next_token_packs_and_unpacks() {
        assert_eq!(unpack_next(pack_next(42, true)), (42, true));
        assert_eq!(unpack_next(pack_next(7, false)), (7, false));
        assert_eq!(unpack_next(NONE_TOKEN), (0, false));
    }

    #[test]
    fn creator_reads_back_supplied_id() {
        let chunk = Chunk::<u64, Vec<u8>, _, _, _, BytesHeader>::new(
            4,
            Vec::new(),
            BlockAllocator::new(),
            BytesSerializer,
            U64Comparator,
            Some(99),
        );
        assert_eq!(chunk.creator(), Some(99));
    }
}
