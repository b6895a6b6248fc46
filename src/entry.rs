// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! The entry slot and its field codec.
//!
//! # Memory layout
//!
//! ```text
//! Offset  Size  Field
//! 0       4     next (AtomicU32) - successor slot index, 0 = terminator
//! 4       4     _pad
//! 8       8     value_ref (AtomicU64) - packed (block,length,position)
//! 16      8     key_ref (AtomicU64) - packed (block,length,position)
//! ```
//!
//! # Alignment
//!
//! `value_ref` and `key_ref` are real `AtomicU64` fields, so the compiler
//! guarantees 8-byte alignment for both — there is no hand-rolled byte-offset
//! arithmetic to get wrong. `_pad` sits right after `next` rather than at the
//! end of the struct so the two 4-byte fields share one aligned word instead
//! of leaving a compiler-inserted gap before `value_ref` *and* an explicit pad
//! word after `key_ref`, which would round the struct up to 32 bytes.
//!
//! # Memory ordering
//!
//! - **Acquire** on `get_ref`/`get_int(Next)`: synchronizes with the
//!   **Release** of whichever CAS last published the field, so a reader never
//!   observes a reference without also observing everything the writer wrote
//!   before publishing it.
//! - **Release** on the success half of `cas_ref`/`cas_next`: makes prior
//!   writes (the serialized key/value bytes) visible to the next Acquire
//!   reader.
//! - **Relaxed** on `set_int`/`set_ref`: safe only because these are used
//!   exclusively before the slot is linked into the list — no other thread
//!   can yet observe the slot index.

use crate::config::{KEY_LENGTH_BITS, KEY_LENGTH_MASK, VALUE_LENGTH_BITS, VALUE_LENGTH_MASK};
use crate::reference::{KeyReference, ValueReference};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Which reference (key or value) an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefField {
    Value,
    Key,
}

/// A single packed slot: `next` pointer, value reference, key reference.
///
/// Slot 0 in a chunk's entry array is the head sentinel: only its `next`
/// field is meaningful.
#[repr(C)]
pub struct EntrySlot {
    next: AtomicU32,
    _pad: AtomicU32,
    value_ref: AtomicU64,
    key_ref: AtomicU64,
}

impl EntrySlot {
    /// A fresh, unlinked slot: `next = 0`, no value, no key.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
            _pad: AtomicU32::new(0),
            value_ref: AtomicU64::new(0),
            key_ref: AtomicU64::new(0),
        }
    }

    /// Read the successor slot index. `0` means terminator.
    #[inline]
    pub fn next(&self) -> usize {
        self.next.load(Ordering::Acquire) as usize
    }

    /// Write `next` before the slot is linked into the list (no other thread
    /// can yet observe this slot index, so a plain store is correct).
    #[inline]
    pub fn set_next_unlinked(&self, next: usize) {
        self.next.store(next as u32, Ordering::Relaxed);
    }

    /// Single-word CAS on `next`, the only field ever CAS'd after the slot is
    /// reachable from the list (splicing a new successor in, or — in a
    /// future rebalance — relinking).
    #[inline]
    pub fn cas_next(&self, expected: usize, new: usize) -> Result<(), usize> {
        self.next
            .compare_exchange(
                expected as u32,
                new as u32,
                Ordering::Release,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|actual| actual as usize)
    }

    /// Atomic 64-bit read of a reference field.
    #[inline]
    pub fn get_ref(&self, field: RefField) -> u64 {
        match field {
            RefField::Value => self.value_ref.load(Ordering::Acquire),
            RefField::Key => self.key_ref.load(Ordering::Acquire),
        }
    }

    /// Double-word CAS on a reference field.
    #[inline]
    pub fn cas_ref(&self, field: RefField, expected: u64, new: u64) -> Result<(), u64> {
        let atomic = match field {
            RefField::Value => &self.value_ref,
            RefField::Key => &self.key_ref,
        };
        atomic
            .compare_exchange(expected, new, Ordering::Release, Ordering::Acquire)
            .map(|_| ())
    }

    /// Plain (non-atomic-intent) store of the value reference. Used only for
    /// the initial `DELETED_VALUE` write right after the slot is reserved,
    /// before any other thread can see the slot index.
    #[inline]
    pub fn set_value_ref_unlinked(&self, value_ref: ValueReference) {
        self.value_ref.store(value_ref.encode(), Ordering::Relaxed);
    }

    /// Plain store of the key reference. Callers must only use this before
    /// the slot is published (linked into the list); afterwards the key
    /// reference is immutable.
    #[inline]
    pub fn set_key_ref_unlinked(&self, key_ref: KeyReference) {
        self.key_ref.store(key_ref.encode(), Ordering::Relaxed);
    }

    /// Read the value reference, decoded.
    #[inline]
    pub fn value_ref(&self) -> ValueReference {
        ValueReference::decode(self.get_ref(RefField::Value))
    }

    /// Read the key reference, decoded. Valid only once the slot has been
    /// linked into the list (the key reference is write-once before that).
    #[inline]
    pub fn key_ref(&self) -> KeyReference {
        KeyReference::decode(self.get_ref(RefField::Key))
    }

    /// Bulk-copy the value reference, key reference, and padding word from
    /// `src` into `self`. Used by `copy_part_no_keys` to move a run of live
    /// slots without re-deriving each packed field. `next` is intentionally
    /// left untouched — the caller overwrites it to point at the successor
    /// in the destination's physical order.
    #[inline]
    pub fn copy_fields_from(&self, src: &EntrySlot) {
        self.value_ref
            .store(src.value_ref.load(Ordering::Acquire), Ordering::Relaxed);
        self.key_ref
            .store(src.key_ref.load(Ordering::Acquire), Ordering::Relaxed);
        self._pad
            .store(src._pad.load(Ordering::Relaxed), Ordering::Relaxed);
    }
}

impl Default for EntrySlot {
    fn default() -> Self {
        Self::new()
    }
}

// EntrySlot's fields are all atomics with no interior `UnsafeCell`, so
// Send + Sync are derived automatically — no unsafe impl needed here, unlike
// the byte-buffer-backed collaborators in `mem`.

/// Unpack the length sub-field from a raw packed reference word, given the
/// number of bits reserved for length (23 for values, 16 for keys).
#[inline]
pub fn unpack_length(word1: u32, length_bits: u32) -> u32 {
    let mask = (1u32 << length_bits) - 1;
    word1 & mask
}

/// Unpack the block sub-field from a raw packed reference word.
#[inline]
pub fn unpack_block(word1: u32, length_bits: u32) -> u32 {
    word1 >> length_bits
}
