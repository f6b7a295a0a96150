//! Ordered mapping from `VirtualPointer` to the live allocation it names.
use std::collections::BTreeMap;

use crate::pointer::VirtualPointer;

/// A single live allocation: the pointer it was returned under, and the size
/// needed at `deallocate` time to release the right number of pages.
#[derive(Debug, Clone, Copy)]
pub struct TrackedBlock {
    pub pointer: VirtualPointer,
    pub size_bytes: usize,
}

/// Ordered associative container keyed by `VirtualPointer`. A `BTreeMap`
/// satisfies the ordering requirement directly — ordering exists only to
/// make teardown iteration deterministic for tests, not for any semantic
/// reason.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: BTreeMap<VirtualPointer, TrackedBlock>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
        }
    }

    /// Insert a new block. Panics if `pointer` is already tracked — callers
    /// are never expected to double-insert under the same pointer.
    pub fn insert(&mut self, block: TrackedBlock) {
        let prior = self.blocks.insert(block.pointer, block);
        assert!(prior.is_none(), "pointer {:?} already tracked", block.pointer);
    }

    pub fn find(&self, pointer: VirtualPointer) -> Option<TrackedBlock> {
        self.blocks.get(&pointer).copied()
    }

    /// Remove and return the tracked block at `pointer`, if any.
    pub fn remove(&mut self, pointer: VirtualPointer) -> Option<TrackedBlock> {
        self.blocks.remove(&pointer)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every pointer currently tracked, in ascending order. Collected
    /// up front so callers (namely `destroy`) can remove entries from the
    /// registry while iterating, without invalidating the iterator.
    pub fn iter_safe_for_removal(&self) -> Vec<VirtualPointer> {
        self.blocks.keys().copied().collect()
    }
}
