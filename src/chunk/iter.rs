// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Ascending and descending traversal of the sorted linked list.
//!
//! Neither iterator ever deserializes a key or value: the chunk stores only
//! bytes, so both yield `(&[u8], &[u8])` pairs (serialized key, value
//! payload past the header) and leave deserialization to the caller.

use super::Chunk;
use crate::collaborators::{Allocator, Comparator, Serializer, SliceKind, ValueHeader};
use crate::config::HEAD_SLOT;
use std::cmp::Ordering;

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    /// Ascending iterator over every live key in the chunk.
    pub fn iter_ascending(&self) -> AscendingIter<'_, K, V, A, S, C, H> {
        AscendingIter {
            chunk: self,
            current: self.head().next(),
        }
    }

    /// Ascending iterator starting at `from`. `inclusive` controls whether a
    /// slot with key exactly equal to `from` is yielded.
    pub fn iter_ascending_from(&self, from: &K, inclusive: bool) -> AscendingIter<'_, K, V, A, S, C, H> {
        let anchor = self.binary_find(from);
        let mut current = self.slot(anchor).next();
        while current != HEAD_SLOT {
            match self.comparator.compare(from, self.key_at(current)) {
                Ordering::Greater => current = self.slot(current).next(),
                Ordering::Equal if !inclusive => current = self.slot(current).next(),
                _ => break,
            }
        }
        AscendingIter { chunk: self, current }
    }

    /// Descending iterator over every live key in the chunk.
    ///
    /// No back-pointers exist, so this eagerly walks the list once (bounded
    /// by `max_items`, the same bound the entry array itself is bounded by)
    /// to fill a stack, then pops it lazily. An overflow past `max_items`
    /// entries indicates a corrupted list and panics rather than truncating.
    pub fn iter_descending(&self) -> DescendingIter<'_> {
        self.build_descending_stack(None)
    }

    /// Descending iterator bounded above by `from`. `inclusive` controls
    /// whether a slot with key exactly equal to `from` is yielded.
    pub fn iter_descending_from(&self, from: &K, inclusive: bool) -> DescendingIter<'_> {
        self.build_descending_stack(Some((from, inclusive)))
    }

    fn build_descending_stack(&self, bound: Option<(&K, bool)>) -> DescendingIter<'_> {
        let mut stack = Vec::new();
        let mut curr = self.head().next();
        while curr != HEAD_SLOT {
            if let Some((from, inclusive)) = bound {
                let past = match self.comparator.compare(from, self.key_at(curr)) {
                    Ordering::Less => true,
                    Ordering::Equal => !inclusive,
                    Ordering::Greater => false,
                };
                if past {
                    break;
                }
            }

            if let Some(pair) = self.live_pair_at(curr) {
                if stack.len() >= self.max_items {
                    panic!(
                        "descending iterator stack exceeded max_items ({}); list is corrupted",
                        self.max_items
                    );
                }
                stack.push(pair);
            }

            curr = self.slot(curr).next();
        }
        DescendingIter { stack }
    }

    fn live_pair_at(&self, slot: usize) -> Option<(&[u8], &[u8])> {
        let value_ref = self.read_value_ref(slot);
        if value_ref.is_deleted() {
            return None;
        }
        let bytes = self.allocator.resolve(
            value_ref.block,
            value_ref.position,
            value_ref.length,
            SliceKind::Value,
        );
        if H::is_deleted(bytes) {
            return None;
        }
        Some((self.key_at(slot), &bytes[H::HEADER_SIZE..]))
    }
}

/// Lazy forward walk of the sorted linked list, skipping detached or
/// logically deleted values.
pub struct AscendingIter<'a, K, V, A, S, C, H> {
    chunk: &'a Chunk<K, V, A, S, C, H>,
    current: usize,
}

impl<'a, K, V, A, S, C, H> Iterator for AscendingIter<'a, K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current != HEAD_SLOT {
            let slot = self.current;
            self.current = self.chunk.slot(slot).next();
            if let Some(pair) = self.chunk.live_pair_at(slot) {
                return Some(pair);
            }
        }
        None
    }
}

/// Reverse walk, backed by a stack filled in a single forward pass since the
/// list carries no back-pointers.
pub struct DescendingIter<'a> {
    stack: Vec<(&'a [u8], &'a [u8])>,
}

impl<'a> Iterator for DescendingIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.stack.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_chunk;

    fn insert(chunk: &super::super::Chunk<
        u64,
        Vec<u8>,
        crate::mem::BlockAllocator,
        crate::mem::BytesSerializer,
        crate::mem::U64Comparator,
        crate::mem::BytesHeader,
    >, key: u64) {
        let ei = chunk.allocate_entry_and_key(&key).unwrap();
        chunk.link_entry(ei, &key);
    }

    fn key_of(bytes: &[u8]) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        u64::from_be_bytes(buf)
    }

    #[test]
    fn ascending_iter_skips_nothing_on_fresh_inserts() {
        let chunk = test_chunk(8);
        for k in [5u64, 3, 7, 1] {
            insert(&chunk, k);
        }
        let keys: Vec<u64> = chunk.iter_ascending().map(|(k, _)| key_of(k)).collect();
        assert_eq!(keys, vec![1, 3, 5, 7]);
    }

    #[test]
    fn descending_iter_reverses_ascending_order() {
        let chunk = test_chunk(8);
        for k in [5u64, 3, 7, 1] {
            insert(&chunk, k);
        }
        let keys: Vec<u64> = chunk.iter_descending().map(|(k, _)| key_of(k)).collect();
        assert_eq!(keys, vec![7, 5, 3, 1]);
    }

    #[test]
    fn descending_iter_from_respects_inclusive_bound() {
        let chunk = test_chunk(8);
        for k in [10u64, 20, 30, 40, 50] {
            insert(&chunk, k);
        }
        let keys: Vec<u64> = chunk
            .iter_descending_from(&35, true)
            .map(|(k, _)| key_of(k))
            .collect();
        assert_eq!(keys, vec![30, 20, 10]);

        let keys: Vec<u64> = chunk
            .iter_descending_from(&30, false)
            .map(|(k, _)| key_of(k))
            .collect();
        assert_eq!(keys, vec![20, 10]);
    }

    #[test]
    fn ascending_iter_from_respects_inclusive_bound() {
        let chunk = test_chunk(8);
        for k in [10u64, 20, 30, 40, 50] {
            insert(&chunk, k);
        }
        let keys: Vec<u64> = chunk
            .iter_ascending_from(&25, true)
            .map(|(k, _)| key_of(k))
            .collect();
        assert_eq!(keys, vec![30, 40, 50]);
    }
}
