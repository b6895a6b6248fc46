// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Contracts for the chunk's out-of-scope collaborators.
//!
//! The chunk never manages off-heap memory, serialization, key ordering, or
//! the value-header lock protocol itself — those belong to the enclosing
//! store. This module defines the boundary as traits; [`crate::mem`] ships
//! one reference implementation of each so the chunk can be exercised and
//! benchmarked standalone.

use std::cmp::Ordering;

/// Which kind of slice is being requested — keys and values are tracked in
/// separate block-id spaces with different size limits (see `config`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    Key,
    Value,
}

/// A freshly allocated off-heap slice, described by its reference triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatedSlice {
    pub block: u32,
    pub position: u32,
    pub length: u32,
}

/// The block-based off-heap allocator.
///
/// Implementations own the backing memory for at least as long as any
/// [`AllocatedSlice`] they handed out might still be resolved or released.
pub trait Allocator: Send + Sync {
    /// Reserve `size` bytes for a key or value slice.
    fn allocate_slice(
        &self,
        size: usize,
        kind: SliceKind,
    ) -> crate::error::Result<AllocatedSlice>;

    /// Release a previously allocated slice. Implementations may defer the
    /// actual reclamation (e.g. via an epoch scheme) past this call.
    fn release_slice(&self, slice: AllocatedSlice, kind: SliceKind);

    /// Resolve a reference back to its bytes.
    fn resolve(&self, block: u32, position: u32, length: u32, kind: SliceKind) -> &[u8];

    /// Resolve a reference back to its bytes, mutably, for in-place writes
    /// (serialization, header initialization, compute).
    ///
    /// # Safety
    ///
    /// The caller must ensure no other reference to the same slice is live
    /// for the duration of the borrow — allocators enforce this via their
    /// allocation bitmap, not via the type system.
    #[allow(clippy::mut_from_ref)]
    fn resolve_mut(&self, block: u32, position: u32, length: u32, kind: SliceKind) -> &mut [u8];
}

/// Serializes values of type `V` into allocator-provided byte slices.
pub trait Serializer<V>: Send + Sync {
    /// Number of bytes `value` will occupy once serialized.
    fn calculate_size(&self, value: &V) -> usize;

    /// Serialize `value` into `out`, which is exactly `calculate_size(value)`
    /// bytes long.
    fn serialize(&self, value: &V, out: &mut [u8]);
}

/// Total order over keys, with a fast path that avoids deserializing a
/// candidate key purely to compare it.
pub trait Comparator<K>: Send + Sync {
    /// Compare two already-deserialized keys.
    fn compare_keys(&self, a: &K, b: &K) -> Ordering;

    /// Compare a key against another key's serialized bytes directly.
    fn compare(&self, key: &K, serialized: &[u8]) -> Ordering;

    /// Number of bytes `key` will occupy once serialized.
    fn calculate_size(&self, key: &K) -> usize;

    /// Serialize `key` into `out`, which is exactly `calculate_size(key)`
    /// bytes long.
    fn serialize(&self, key: &K, out: &mut [u8]);
}

/// Outcome of an in-place [`ValueHeader::compute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeOutcome {
    /// `f` ran under the header lock and the value was not deleted.
    Success,
    /// The value was concurrently deleted; the caller should retry with the
    /// value reference it just observed.
    Deleted,
}

/// The value-header lock protocol used for in-place compute.
///
/// Every value slice begins with a fixed-size header holding a lock/flag
/// state; implementations apply a closure to the remainder of the slice
/// atomically with respect to other `compute` callers.
pub trait ValueHeader {
    /// Size in bytes of the header prefix, not visible to `compute`'s closure.
    const HEADER_SIZE: usize;

    /// Initialize a freshly allocated value slice's header (unlocked, live).
    fn init_header(slice: &mut [u8]);

    /// `true` if the header marks this value as logically deleted.
    fn is_deleted(slice: &[u8]) -> bool;

    /// Apply `f` to the slice's payload (the bytes past the header) while
    /// holding the header's lock.
    fn compute(slice: &mut [u8], f: impl FnOnce(&mut [u8])) -> ComputeOutcome;
}
