// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Binary search over the sorted prefix, then a linear walk down the list.

use super::Chunk;
use crate::collaborators::{Allocator, Comparator, Serializer, SliceKind, ValueHeader};
use crate::config::HEAD_SLOT;
use std::cmp::Ordering;
use std::sync::atomic::Ordering as AtomicOrdering;

/// What `lookup` found for a key known to be present.
pub struct LookupResult<'a> {
    pub slot: usize,
    pub value: Option<&'a [u8]>,
}

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    pub(crate) fn key_at(&self, slot: usize) -> &[u8] {
        let key_ref = self.slot(slot).key_ref();
        self.allocator
            .resolve(key_ref.block, key_ref.position, key_ref.length, SliceKind::Key)
    }

    /// Return the slot index of the largest sorted-prefix entry whose key is
    /// `<= key`, or the head slot if no such entry exists.
    pub(crate) fn binary_find(&self, key: &K) -> usize {
        let sorted_count = self.sorted_count();
        if sorted_count == 0 {
            return HEAD_SLOT;
        }
        if self.comparator.compare(key, self.key_at(1)) == Ordering::Less {
            return HEAD_SLOT;
        }
        if self.comparator.compare(key, self.key_at(sorted_count)) == Ordering::Greater {
            return sorted_count;
        }

        let (mut low, mut high) = (1usize, sorted_count);
        while low < high {
            let mid = low + (high - low + 1) / 2;
            match self.comparator.compare(key, self.key_at(mid)) {
                Ordering::Less => high = mid - 1,
                _ => low = mid,
            }
        }
        low
    }

    pub(crate) fn read_value_ref(&self, slot: usize) -> crate::reference::ValueReference {
        self.slot(slot).value_ref()
    }

    pub(crate) fn sorted_count_relaxed(&self) -> usize {
        self.sorted_count.load(AtomicOrdering::Relaxed)
    }
}

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    /// Look up `key`. Returns `None` if absent; `Some(LookupResult)` with
    /// `value = None` if the key was once present but its value has been
    /// detached (logically deleted).
    pub fn lookup(&self, key: &K) -> Option<LookupResult<'_>> {
        let anchor = self.binary_find(key);
        let mut curr = self.slot(anchor).next();

        while curr != HEAD_SLOT {
            match self.comparator.compare(key, self.key_at(curr)) {
                Ordering::Less => return None,
                Ordering::Equal => {
                    let value_ref = self.slot(curr).value_ref();
                    if value_ref.is_deleted() {
                        return Some(LookupResult { slot: curr, value: None });
                    }
                    let bytes = self.allocator.resolve(
                        value_ref.block,
                        value_ref.position,
                        value_ref.length,
                        SliceKind::Value,
                    );
                    if H::is_deleted(bytes) {
                        return Some(LookupResult { slot: curr, value: None });
                    }
                    return Some(LookupResult {
                        slot: curr,
                        value: Some(&bytes[H::HEADER_SIZE..]),
                    });
                }
                Ordering::Greater => {
                    curr = self.slot(curr).next();
                }
            }
        }
        None
    }
}
