// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Chunk statistics and rebalance heuristic inputs.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters a chunk maintains about itself: how many entries it has added,
/// how many it started with at construction (via sorted copy), how many
/// slots were compacted away, and the external (off-heap) byte footprint of
/// its live values.
#[derive(Debug, Default)]
pub struct Statistics {
    added_count: AtomicUsize,
    initial_sorted_count: AtomicUsize,
    compacted_count: AtomicUsize,
    external_size: AtomicUsize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the number of live (key, value) pairs contributed since this
    /// chunk's construction.
    pub fn added_count(&self) -> usize {
        self.added_count.load(Ordering::Relaxed)
    }

    pub(crate) fn record_value_attached(&self) {
        self.added_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_value_detached(&self) {
        self.added_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of live entries this chunk started with (set once, by
    /// `copy_part_no_keys`, never CAS'd).
    pub fn initial_sorted_count(&self) -> usize {
        self.initial_sorted_count.load(Ordering::Relaxed)
    }

    pub(crate) fn set_initial_sorted_count(&self, count: usize) {
        self.initial_sorted_count.store(count, Ordering::Relaxed);
    }

    /// Number of slots skipped (dead) during the last `copy_part_no_keys`
    /// into this chunk.
    pub fn compacted_count(&self) -> usize {
        self.compacted_count.load(Ordering::Relaxed)
    }

    pub(crate) fn add_compacted(&self, n: usize) {
        self.compacted_count.fetch_add(n, Ordering::Relaxed);
    }

    /// External (off-heap) byte footprint of all live values this chunk
    /// currently holds references to.
    pub fn external_size(&self) -> usize {
        self.external_size.load(Ordering::Relaxed)
    }

    pub(crate) fn add_external_size(&self, bytes: usize) {
        self.external_size.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn sub_external_size(&self, bytes: usize) {
        self.external_size.fetch_sub(bytes, Ordering::Relaxed);
    }
}
