// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Attach, replace, and detach a slot's value reference.

use super::Chunk;
use crate::collaborators::{Allocator, Comparator, ComputeOutcome, Serializer, SliceKind, ValueHeader};
use crate::reference::{ValueReference, DELETED_VALUE};

/// Which mutation `point_to_value` performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Unconditionally attach `new`; on any contention, restart the whole
    /// caller-side operation (re-lookup, re-link if needed).
    Put,
    /// Attach `new` only if no live value is currently present.
    PutIfAbsent,
    /// Apply a closure to the existing live value in place.
    Compute,
    /// Detach whatever value is currently present.
    Remove,
}

/// A `point_to_value` request: which slot, the CAS's expected/desired
/// references, and (for `Compute`) the closure to run under the value
/// header's lock.
///
/// Fields are crate-private: the constructors below are the only way to
/// build one, which is what keeps `compute_fn` set precisely when
/// `kind == OpKind::Compute` and nowhere else.
pub struct Op<'f> {
    pub(crate) kind: OpKind,
    pub(crate) slot: usize,
    pub(crate) old: ValueReference,
    pub(crate) new: ValueReference,
    pub(crate) compute_fn: Option<Box<dyn FnMut(&mut [u8]) + 'f>>,
}

impl<'f> Op<'f> {
    pub fn put(slot: usize, old: ValueReference, new: ValueReference) -> Self {
        Self {
            kind: OpKind::Put,
            slot,
            old,
            new,
            compute_fn: None,
        }
    }

    pub fn put_if_absent(slot: usize, new: ValueReference) -> Self {
        Self {
            kind: OpKind::PutIfAbsent,
            slot,
            old: DELETED_VALUE,
            new,
            compute_fn: None,
        }
    }

    pub fn remove(slot: usize, old: ValueReference) -> Self {
        Self {
            kind: OpKind::Remove,
            slot,
            old,
            new: DELETED_VALUE,
            compute_fn: None,
        }
    }

    pub fn compute(slot: usize, old: ValueReference, f: impl FnMut(&mut [u8]) + 'f) -> Self {
        Self {
            kind: OpKind::Compute,
            slot,
            old,
            new: old,
            compute_fn: Some(Box::new(f)),
        }
    }
}

/// Outcome of `point_to_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointToValueOutcome {
    /// The CAS (or an in-place compute) succeeded.
    Success,
    /// `PutIfAbsent` lost: a live value is already present.
    Failed,
    /// `Put` observed contention; the caller must restart from lookup.
    RestartOperation,
}

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    /// Attach, replace, or detach the value reference at `op.slot`.
    ///
    /// `Compute` never touches the slot's value reference itself (`old` and
    /// `new` are the same reference by construction), so routing it through
    /// the CAS below would let the very first attempt succeed trivially
    /// without ever running the closure. It gets its own path instead.
    pub fn point_to_value(&self, mut op: Op<'_>) -> PointToValueOutcome {
        if op.kind == OpKind::Compute {
            return self.compute_in_place(op);
        }

        loop {
            match self.slot(op.slot).cas_ref(
                crate::entry::RefField::Value,
                op.old.encode(),
                op.new.encode(),
            ) {
                Ok(()) => {
                    self.update_stats_for_transition(op.old, op.new);
                    return PointToValueOutcome::Success;
                }
                Err(current) => {
                    if current == op.new.encode() {
                        return PointToValueOutcome::Success;
                    }
                    let current_ref = ValueReference::decode(current);
                    if current_ref.is_deleted() {
                        op.old = DELETED_VALUE;
                        continue;
                    }
                    match op.kind {
                        OpKind::Remove => return PointToValueOutcome::Success,
                        OpKind::PutIfAbsent => return PointToValueOutcome::Failed,
                        OpKind::Put => return PointToValueOutcome::RestartOperation,
                        OpKind::Compute => unreachable!("handled above"),
                    }
                }
            }
        }
    }

    /// Apply `op.compute_fn` to the slot's live value under the header's
    /// lock. Retries if a concurrent `Remove` detached the value between the
    /// read of the current reference and the header lock acquisition.
    fn compute_in_place(&self, mut op: Op<'_>) -> PointToValueOutcome {
        loop {
            let current = self.read_value_ref(op.slot);
            if current.is_deleted() {
                return PointToValueOutcome::Failed;
            }
            let bytes = self.allocator.resolve_mut(
                current.block,
                current.position,
                current.length,
                SliceKind::Value,
            );
            let f = op
                .compute_fn
                .as_deref_mut()
                .expect("Compute op must carry a closure");
            match H::compute(bytes, |payload| f(payload)) {
                ComputeOutcome::Success => return PointToValueOutcome::Success,
                ComputeOutcome::Deleted => continue,
            }
        }
    }

    fn update_stats_for_transition(&self, old: ValueReference, new: ValueReference) {
        match (old.is_deleted(), new.is_deleted()) {
            (true, false) => {
                self.stats.record_value_attached();
                self.stats.add_external_size(new.length as usize);
            }
            (false, true) => {
                self.stats.record_value_detached();
                self.stats.sub_external_size(old.length as usize);
            }
            (false, false) => {
                if new.length > old.length {
                    self.stats.add_external_size((new.length - old.length) as usize);
                } else if new.length < old.length {
                    self.stats.sub_external_size((old.length - new.length) as usize);
                }
            }
            (true, true) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_chunk;
    use crate::reference::ValueReference;

    #[test]
    fn put_if_absent_attaches_when_no_value_present() {
        let chunk = test_chunk(4);
        let ei = chunk.allocate_entry_and_key(&1u64).unwrap();
        chunk.link_entry(ei, &1u64);

        let slice = chunk
            .allocator_for_test()
            .allocate_slice(9, SliceKind::Value)
            .unwrap();
        let new = ValueReference::new(slice.block, slice.length, slice.position);
        let outcome = chunk.point_to_value(Op::put_if_absent(ei, new));
        assert_eq!(outcome, PointToValueOutcome::Success);
        assert_eq!(chunk.statistics().added_count(), 1);
    }

    #[test]
    fn put_if_absent_fails_when_value_already_present() {
        let chunk = test_chunk(4);
        let ei = chunk.allocate_entry_and_key(&1u64).unwrap();
        chunk.link_entry(ei, &1u64);

        let slice1 = chunk
            .allocator_for_test()
            .allocate_slice(9, SliceKind::Value)
            .unwrap();
        let v1 = ValueReference::new(slice1.block, slice1.length, slice1.position);
        chunk.point_to_value(Op::put_if_absent(ei, v1));

        let slice2 = chunk
            .allocator_for_test()
            .allocate_slice(9, SliceKind::Value)
            .unwrap();
        let v2 = ValueReference::new(slice2.block, slice2.length, slice2.position);
        let outcome = chunk.point_to_value(Op::put_if_absent(ei, v2));
        assert_eq!(outcome, PointToValueOutcome::Failed);
    }

    #[test]
    fn remove_detaches_value_and_updates_stats() {
        let chunk = test_chunk(4);
        let ei = chunk.allocate_entry_and_key(&1u64).unwrap();
        chunk.link_entry(ei, &1u64);

        let slice = chunk
            .allocator_for_test()
            .allocate_slice(9, SliceKind::Value)
            .unwrap();
        let v = ValueReference::new(slice.block, slice.length, slice.position);
        chunk.point_to_value(Op::put_if_absent(ei, v));

        let outcome = chunk.point_to_value(Op::remove(ei, v));
        assert_eq!(outcome, PointToValueOutcome::Success);
        assert_eq!(chunk.statistics().added_count(), 0);
    }

    #[test]
    fn compute_mutates_live_value_in_place() {
        let chunk = test_chunk(4);
        let ei = chunk.allocate_entry_and_key(&1u64).unwrap();
        chunk.link_entry(ei, &1u64);

        let slice = chunk
            .allocator_for_test()
            .allocate_slice(9, SliceKind::Value)
            .unwrap();
        let v = ValueReference::new(slice.block, slice.length, slice.position);
        chunk.point_to_value(Op::put_if_absent(ei, v));

        let outcome = chunk.point_to_value(Op::compute(ei, v, |payload| {
            payload[0] = 7;
        }));
        assert_eq!(outcome, PointToValueOutcome::Success);

        let lookup = chunk.lookup(&1u64).unwrap();
        assert_eq!(lookup.value.unwrap()[0], 7);
    }
}
