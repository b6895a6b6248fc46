// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! # sorted-chunk
//!
//! A concurrent, lock-free ordered-map chunk: the per-shard data structure of
//! an off-heap key-value store.
//!
//! A [`Chunk`] threads a fixed-capacity array of entry slots into a sorted
//! singly-linked list using single-word and double-word atomic
//! compare-and-swap, and moves through an `Infant -> Normal -> Frozen ->
//! Released` lifecycle as the enclosing store splits and retires it. Keys and
//! values never live inside the chunk; it stores only packed references into
//! off-heap memory owned by an [`Allocator`](collaborators::Allocator).
//!
//! ## Quick Start
//!
//! ```
//! use sorted_chunk::Chunk;
//! use sorted_chunk::mem::{BlockAllocator, BytesHeader, BytesSerializer, U64Comparator};
//!
//! let chunk: Chunk<u64, Vec<u8>, _, _, _, BytesHeader> = Chunk::new(
//!     64,
//!     0u64.to_be_bytes().to_vec(),
//!     BlockAllocator::new(),
//!     BytesSerializer,
//!     U64Comparator,
//!     None,
//! );
//! chunk.normalize();
//!
//! let key = 42u64;
//! let ei = chunk.allocate_entry_and_key(&key).unwrap();
//! chunk.link_entry(ei, &key);
//!
//! // present, but no value has been attached yet
//! assert!(chunk.lookup(&key).unwrap().value.is_none());
//! assert!(chunk.lookup(&43u64).is_none());
//! ```
//!
//! ## Modules Overview
//!
//! - [`chunk`] - the `Chunk` type and its operations (start here)
//! - [`entry`] - the packed entry-slot layout
//! - [`reference`] - key/value reference packing
//! - [`collaborators`] - traits the enclosing store must supply
//! - [`mem`] - reference collaborator implementations, used by this crate's
//!   own tests and benchmarks
//! - [`config`] - tunable constants
//! - [`logging`] - compile-time configurable logging macros
//! - [`error`] - the error type returned by chunk operations

/// Chunk-wide tunable constants.
pub mod config;
/// Contracts for the chunk's out-of-scope collaborators.
pub mod collaborators;
/// The concurrent, lock-free ordered-map chunk.
pub mod chunk;
/// The packed entry-slot layout.
pub mod entry;
/// Errors returned by chunk operations.
pub mod error;
/// Compile-time configurable logging.
pub mod logging;
/// Reference implementations of the chunk's collaborator traits.
pub mod mem;
/// Key/value reference packing.
pub mod reference;

pub use chunk::{AscendingIter, Chunk, DescendingIter, Op, OpKind, State, Statistics};
pub use error::{ChunkError, Result};
pub use reference::{KeyReference, ValueReference};

#[doc(hidden)]
pub use log as __log;
