//! Paged, optionally disk-backed allocator.
//!
//! Hands out opaque [`VirtualPointer`]s to contiguous regions of either
//! process memory or a backing file whose logical size can greatly exceed
//! available RAM. Coordinates concurrent allocators across shared-memory
//! worker threads (an intra-process mutex) and across distributed-memory
//! ranks (an injected [`Collective`] capability) so every participant
//! agrees on the identity of every pointer while only the owner rank
//! performs bookkeeping.
//!
//! This crate is the storage substrate for a block-structured consumer
//! layer above it (block-space indexing, canonical/zero/derivative block
//! semantics) — that layer is external; this crate only ever sees
//! `(pointer, size)` pairs.

mod bitmap;
mod collective;
mod error;
mod facade;
mod file_store;
mod heap_allocator;
mod io;
mod page_allocator;
mod pointer;
mod registry;

#[cfg(test)]
mod tests;

pub use collective::{Collective, SingleRank};
pub use error::AllocError;
pub use facade::Allocator;
pub use pointer::{VirtualPointer, NULL_PTR};

/// Fixed granularity of both allocation and bitmap tracking: 512 KiB.
pub const PAGE_SIZE: u64 = 512 * 1024;

/// File-growth step once the backing file exceeds this size: 256 GiB.
/// Below it, growth doubles the current size instead (see
/// [`Allocator::allocate`]'s growth policy in `file_store::FileStore::grow`).
pub const GROW_SIZE: u64 = 256 * 1024 * 1024 * 1024;

static_assertions::const_assert!(PAGE_SIZE.is_power_of_two());
