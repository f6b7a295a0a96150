//! Injected collective-communication capability.
//!
//! Rank coordination and barrier/broadcast primitives are taken as a trait
//! supplied at `create` time rather than hard-wired into the allocator — a
//! real MPI- or channel-backed implementation is plugged in by the embedding
//! application; the default is a single no-op participant so the core is
//! unit-testable without a distributed runtime.
use std::sync::{Arc, Barrier, Mutex};

/// Distributed-rank coordination: exactly one participant (rank 0, the
/// owner) mutates allocator state; every other participant observes it
/// through `barrier`/`broadcast_u64`.
pub trait Collective: Send + Sync {
    /// This participant's rank. Rank 0 is the owner.
    fn rank(&self) -> usize;

    fn is_owner(&self) -> bool {
        self.rank() == 0
    }

    /// Collective barrier used once at `create`, separating the owner's
    /// file creation from peers opening the same path.
    fn barrier(&self);

    /// Collective broadcast used at `allocate`. Called with the owner's
    /// value on the owner and an arbitrary placeholder on every peer;
    /// returns the owner's value to every participant, including the owner.
    fn broadcast_u64(&self, value: u64) -> u64;
}

/// The default single-participant implementation: every operation is a
/// no-op that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleRank;

impl Collective for SingleRank {
    fn rank(&self) -> usize {
        0
    }

    fn barrier(&self) {}

    fn broadcast_u64(&self, value: u64) -> u64 {
        value
    }
}

/// Test-only multi-participant `Collective` wired over in-process barriers,
/// so peer ranks observing the owner's pointer sequence is exercisable
/// without a real distributed runtime — a mock capability in the same vein
/// as an in-memory stand-in for a hardware device.
#[cfg(test)]
pub(crate) struct LoopbackCollective {
    rank: usize,
    create_barrier: Arc<Barrier>,
    value_slot: Arc<Mutex<u64>>,
    enter_barrier: Arc<Barrier>,
    exit_barrier: Arc<Barrier>,
}

#[cfg(test)]
impl LoopbackCollective {
    /// Build `n` handles — index 0 is the owner — sharing one barrier/value
    /// rendezvous group.
    pub(crate) fn new_group(n: usize) -> Vec<Self> {
        let create_barrier = Arc::new(Barrier::new(n));
        let value_slot = Arc::new(Mutex::new(0));
        let enter_barrier = Arc::new(Barrier::new(n));
        let exit_barrier = Arc::new(Barrier::new(n));
        (0..n)
            .map(|rank| LoopbackCollective {
                rank,
                create_barrier: create_barrier.clone(),
                value_slot: value_slot.clone(),
                enter_barrier: enter_barrier.clone(),
                exit_barrier: exit_barrier.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
impl Collective for LoopbackCollective {
    fn rank(&self) -> usize {
        self.rank
    }

    fn barrier(&self) {
        self.create_barrier.wait();
    }

    fn broadcast_u64(&self, value: u64) -> u64 {
        if self.rank == 0 {
            *self.value_slot.lock().unwrap() = value;
        }
        self.enter_barrier.wait();
        let v = *self.value_slot.lock().unwrap();
        self.exit_barrier.wait();
        v
    }
}
