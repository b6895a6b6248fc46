// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! The `Infant -> Normal -> Frozen -> Released` state machine and the
//! `publish`/`unpublish` protocol that lets `freeze` observe a quiescent
//! chunk before handing it to the rebalancer.

use super::{Chunk, State, NONE_TOKEN};
use crate::collaborators::{Allocator, Comparator, Serializer, ValueHeader};
use crate::error::{ChunkError, Result};
use std::sync::atomic::Ordering;

impl<K, V, A, S, C, H> Chunk<K, V, A, S, C, H>
where
    A: Allocator,
    S: Serializer<V>,
    C: Comparator<K>,
    H: ValueHeader,
{
    /// `Infant -> Normal`, clearing `creator`. A no-op once already `Normal`
    /// (or past it).
    pub fn normalize(&self) {
        if self
            .state
            .compare_exchange(
                State::Infant as u8,
                State::Normal as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }
        self.creator.store(NONE_TOKEN, Ordering::Release);
    }

    /// Register an in-flight mutation. Fails with [`ChunkError::Frozen`] once
    /// the chunk has started (or finished) freezing — the caller must retry
    /// on a successor chunk, never re-enter this one.
    pub fn publish(&self) -> Result<()> {
        self.pending_ops.fetch_add(1, Ordering::AcqRel);
        match self.state() {
            State::Frozen | State::Released => {
                self.pending_ops.fetch_sub(1, Ordering::AcqRel);
                Err(ChunkError::Frozen)
            }
            State::Infant | State::Normal => Ok(()),
        }
    }

    /// Deregister an in-flight mutation previously registered by `publish`.
    pub fn unpublish(&self) {
        self.pending_ops.fetch_sub(1, Ordering::AcqRel);
    }

    /// `Normal -> Frozen`, then spin until every `publish`ed mutation has
    /// called `unpublish`. A no-op once already `Frozen`/`Released`.
    ///
    /// After this returns, no new mutation can begin and every in-flight one
    /// has completed, so the rebalancer may read the entry array without
    /// racing a writer.
    pub fn freeze(&self) {
        let prior = self.state.swap(State::Frozen as u8, Ordering::AcqRel);
        if prior == State::Released as u8 {
            self.state.store(State::Released as u8, Ordering::Release);
            return;
        }

        let mut spins = 0u32;
        while self.pending_ops.load(Ordering::Acquire) != 0 {
            if spins < 4 {
                // busy spin
            } else if spins < 16 {
                std::hint::spin_loop();
            } else if spins < 32 {
                std::thread::yield_now();
            } else {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            spins = spins.saturating_add(1);
        }
        crate::debug!("chunk frozen after {spins} spin iterations");
    }

    /// `Frozen -> Released`. Only valid once every reader that might still
    /// observe the old chunk has moved past it.
    pub fn release(&self) {
        let _ = self.state.compare_exchange(
            State::Frozen as u8,
            State::Released as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_chunk;
    use super::*;

    #[test]
    fn normalize_moves_infant_to_normal_and_clears_creator() {
        let chunk = Chunk::<
            u64,
            Vec<u8>,
            crate::mem::BlockAllocator,
            crate::mem::BytesSerializer,
            crate::mem::U64Comparator,
            crate::mem::BytesHeader,
        >::new(
            4,
            Vec::new(),
            crate::mem::BlockAllocator::new(),
            crate::mem::BytesSerializer,
            crate::mem::U64Comparator,
            Some(7),
        );
        assert_eq!(chunk.state(), State::Infant);
        chunk.normalize();
        assert_eq!(chunk.state(), State::Normal);
        assert_eq!(chunk.creator(), None);
    }

    #[test]
    fn normalize_twice_is_a_no_op() {
        let chunk = test_chunk(4);
        chunk.normalize();
        chunk.normalize();
        assert_eq!(chunk.state(), State::Normal);
    }

    #[test]
    fn publish_succeeds_while_normal_and_fails_once_frozen() {
        let chunk = test_chunk(4);
        chunk.normalize();
        assert!(chunk.publish().is_ok());
        chunk.unpublish();

        chunk.freeze();
        assert!(matches!(chunk.publish(), Err(ChunkError::Frozen)));
    }

    #[test]
    fn freeze_waits_for_pending_ops_to_drain() {
        let chunk = test_chunk(4);
        chunk.normalize();
        chunk.publish().unwrap();

        let pending = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let done = pending.clone();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(20));
                chunk.unpublish();
                done.store(true, std::sync::atomic::Ordering::Release);
            });
            chunk.freeze();
        });
        assert!(pending.load(std::sync::atomic::Ordering::Acquire));
        assert_eq!(chunk.state(), State::Frozen);
    }

    #[test]
    fn release_requires_frozen_state() {
        let chunk = test_chunk(4);
        chunk.normalize();
        chunk.release();
        assert_eq!(chunk.state(), State::Normal, "release from Normal is a no-op");

        chunk.freeze();
        chunk.release();
        assert_eq!(chunk.state(), State::Released);
    }
}
