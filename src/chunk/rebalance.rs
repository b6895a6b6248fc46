// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Rebalancer cooperation: engagement, the marked next-chunk token, and the
//! key-slice-sharing sorted copy used to build a compacted successor chunk.

use super::{pack_next, unpack_next, Chunk, NONE_TOKEN};
use crate::collaborators::{Allocator, Comparator, Serializer, SliceKind, ValueHeader};
use crate::config::{HEAD_SLOT, REBALANCE_PROB_PERC};
use std::sync::atomic::Ordering;

/// Successor chunk token returned by [`Chunk::mark_and_get_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextRef {
    pub chunk_id: u64,
    pub marked: bool,
}

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    /// Try to become this chunk's rebalancer. Concurrent callers converge on
    /// exactly one winner.
    pub fn engage(&self, rebalancer_id: u64) -> bool {
        self.rebalancer
            .compare_exchange(
                NONE_TOKEN,
                rebalancer_id,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// `true` if `rebalancer_id` is the currently engaged rebalancer.
    pub fn is_engaged(&self, rebalancer_id: u64) -> bool {
        self.rebalancer.load(Ordering::Acquire) == rebalancer_id
    }

    /// The currently engaged rebalancer token, or `None`.
    pub fn rebalancer(&self) -> Option<u64> {
        match self.rebalancer.load(Ordering::Acquire) {
            NONE_TOKEN => None,
            id => Some(id),
        }
    }

    /// Mark the `next` chunk token's deletion-mark bit, returning the
    /// referenced successor. Idempotent: if already marked, just returns it.
    pub fn mark_and_get_next(&self) -> NextRef {
        loop {
            let raw = self.next.load(Ordering::Acquire);
            let (chunk_id, marked) = unpack_next(raw);
            if marked {
                return NextRef { chunk_id, marked };
            }
            let new_raw = pack_next(chunk_id, true);
            if self
                .next
                .compare_exchange(raw, new_raw, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return NextRef { chunk_id, marked: true };
            }
        }
    }

    /// Set this chunk's successor token (unmarked). Used once a rebalance
    /// has built the new chunk and needs to splice it in.
    pub fn set_next(&self, chunk_id: u64) {
        self.next.store(pack_next(chunk_id, false), Ordering::Release);
    }

    /// Copy live entries from a frozen `src` chunk into `self`, starting at
    /// `src`'s slot `src_entry_idx`, sharing key slices rather than
    /// reallocating them. Returns the next unconsumed source slot index to
    /// resume from, or `None` once `src`'s list is exhausted.
    ///
    /// Source slots are grouped into runs of consecutive live entries whose
    /// *physical* indices are contiguous (`curr + 1 == next`); each run is
    /// bulk-copied in one pass instead of re-walking `next` per slot.
    ///
    /// Stops once `self`'s destination cursor reaches `max_capacity` slots.
    pub fn copy_part_no_keys(
        &self,
        src: &Chunk<K, V, A, S, C, H>,
        src_entry_idx: usize,
        max_capacity: usize,
    ) -> Option<usize> {
        debug_assert_eq!(src.state(), super::State::Frozen);

        let mut curr = src_entry_idx;
        let mut dst_cursor = 0usize;
        let mut last_dst = HEAD_SLOT;
        let mut compacted = 0usize;

        while curr != HEAD_SLOT {
            if dst_cursor >= max_capacity {
                self.finish_copy(last_dst, dst_cursor, compacted);
                return Some(curr);
            }

            if !src.slot_is_live(curr) {
                compacted += 1;
                curr = src.slot(curr).next();
                continue;
            }

            // Extend the run while the next physical source slot is both
            // contiguous and live, bounded by remaining destination capacity.
            let run_start = curr;
            let mut run_end = curr;
            let mut run_len = 1usize;
            while dst_cursor + run_len < max_capacity {
                let candidate = run_end + 1;
                let linked_next = src.slot(run_end).next();
                if linked_next != candidate || !src.slot_is_live(candidate) {
                    break;
                }
                run_end = candidate;
                run_len += 1;
            }

            for src_slot in run_start..=run_end {
                dst_cursor += 1;
                let dst_slot = dst_cursor;
                self.slot(dst_slot).copy_fields_from(src.slot(src_slot));
                if last_dst != HEAD_SLOT {
                    self.slot(last_dst).set_next_unlinked(dst_slot);
                } else {
                    self.head().set_next_unlinked(dst_slot);
                }
                last_dst = dst_slot;
            }

            curr = src.slot(run_end).next();
        }

        self.finish_copy(last_dst, dst_cursor, compacted);
        None
    }

    fn slot_is_live(&self, slot: usize) -> bool {
        let value_ref = self.read_value_ref(slot);
        if value_ref.is_deleted() {
            return false;
        }
        let bytes = self.allocator.resolve(
            value_ref.block,
            value_ref.position,
            value_ref.length,
            SliceKind::Value,
        );
        !H::is_deleted(bytes)
    }

    fn finish_copy(&self, last_dst: usize, dst_cursor: usize, compacted: usize) {
        if last_dst != HEAD_SLOT {
            self.slot(last_dst).set_next_unlinked(HEAD_SLOT);
        } else {
            self.head().set_next_unlinked(HEAD_SLOT);
        }
        self.entry_index.store(dst_cursor + 1, Ordering::Release);
        self.sorted_count.store(dst_cursor, Ordering::Release);
        self.stats.set_initial_sorted_count(dst_cursor);
        self.stats.add_compacted(compacted);
        crate::info!(
            "copy_part_no_keys landed {dst_cursor} live entries, compacted {compacted} dead ones"
        );
    }

    /// Sample whether `self` should start a rebalance, per-thread so
    /// concurrent callers never contend on a shared RNG.
    pub fn should_rebalance(&self, rebalance_engaged: bool) -> bool {
        if rebalance_engaged {
            return false;
        }
        if fastrand::u8(0..100) >= REBALANCE_PROB_PERC {
            return false;
        }

        let e = self.entry_index();
        let s = self.sorted_count();
        let i = self.stats.initial_sorted_count() + self.stats.added_count();

        (s == 0 && 2 * e > self.max_items)
            || (s > 0 && 2 * s < e)
            || (5 * e > self.max_items && 5 * i < e)
    }
}
