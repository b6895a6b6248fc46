// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Error types returned by chunk operations.

/// Errors surfaced by the chunk to its caller.
///
/// # Example
///
/// ```
/// use sorted_chunk::ChunkError;
///
/// let err = ChunkError::CapacityExceeded;
/// assert_eq!(err.to_string(), "chunk capacity exceeded");
/// ```
#[derive(Debug)]
pub enum ChunkError {
    // ========================================================================
    // Capacity errors
    // ========================================================================
    /// The entry array is full; the caller should trigger a rebalance and
    /// retry on a successor chunk.
    CapacityExceeded,

    // ========================================================================
    // Lifecycle errors
    // ========================================================================
    /// `publish` observed `Frozen` or `Released`; the caller must retry on a
    /// successor chunk, never re-enter this one.
    Frozen,

    // ========================================================================
    // Collaborator errors
    // ========================================================================
    /// The allocator collaborator could not satisfy a slice request.
    AllocationFailed(String),
}

impl std::fmt::Display for ChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkError::CapacityExceeded => write!(f, "chunk capacity exceeded"),
            ChunkError::Frozen => write!(f, "chunk is frozen or released"),
            ChunkError::AllocationFailed(msg) => write!(f, "allocation failed: {msg}"),
        }
    }
}

impl std::error::Error for ChunkError {}

/// Convenient alias for API results using [`ChunkError`].
pub type Result<T> = core::result::Result<T, ChunkError>;
