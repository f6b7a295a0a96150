//! Public entry point: chooses the page or heap path, coordinates the
//! intra-process mutex and the inter-rank collective, and tracks the
//! registry of live allocations.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::collective::{Collective, SingleRank};
use crate::error::AllocError;
use crate::file_store::FileStore;
use crate::heap_allocator::HeapAllocator;
use crate::io::{self, IoHandle};
use crate::page_allocator::PageAllocator;
use crate::pointer::{VirtualPointer, NULL_PTR};
use crate::registry::{BlockRegistry, TrackedBlock};

enum Backing {
    File(PageAllocator),
    Heap(HeapAllocator),
}

impl Backing {
    fn allocate(&mut self, size_bytes: usize) -> Result<VirtualPointer, AllocError> {
        match self {
            Backing::File(pa) => pa.allocate(size_bytes),
            Backing::Heap(h) => h.allocate(size_bytes).ok_or(AllocError::AllocationFailure),
        }
    }

    fn deallocate(&mut self, ptr: VirtualPointer, size_bytes: usize) {
        match self {
            Backing::File(pa) => pa.deallocate(ptr, size_bytes),
            Backing::Heap(h) => h.deallocate(ptr, size_bytes),
        }
    }
}

struct FacadeState {
    backing: Backing,
    registry: BlockRegistry,
}

/// Process-wide allocation domain. Created once per allocation domain and
/// shared by every shared-memory thread and distributed rank that
/// participates in it.
///
/// `C` is the injected [`Collective`] capability; it defaults to
/// [`SingleRank`], the zero-cost single-participant implementation, the
/// same way `std::collections::HashMap`'s hasher parameter defaults to
/// `RandomState`.
pub struct Allocator<C: Collective = SingleRank> {
    collective: C,
    path: Option<PathBuf>,
    io_handle: IoHandle,
    state: Mutex<FacadeState>,
}

impl Allocator<SingleRank> {
    /// Create a single-rank allocator. `path` selects file-backed (disk
    /// scratch space) vs. heap-backed storage.
    pub fn create(path: Option<&Path>) -> Result<Self, AllocError> {
        Self::create_with_collective(path, SingleRank)
    }
}

impl<C: Collective> Allocator<C> {
    /// Create an allocator participating in `collective`'s rank group.
    /// On the owner rank with a path: creates and truncates the backing
    /// file before the startup barrier. On peer ranks: waits at the
    /// barrier, then opens the file the owner just created. Heap-backed
    /// allocators skip the barrier entirely (no file to wait for).
    pub fn create_with_collective(path: Option<&Path>, collective: C) -> Result<Self, AllocError> {
        let (backing, io_handle) = match path {
            Some(p) => {
                let store = if collective.is_owner() {
                    let store = FileStore::create(p)?;
                    collective.barrier();
                    store
                } else {
                    collective.barrier();
                    FileStore::open_existing(p)?
                };
                let handle = IoHandle::File(store.file_handle());
                (Backing::File(PageAllocator::new(store)), handle)
            }
            None => (Backing::Heap(HeapAllocator::new()), IoHandle::Heap),
        };

        Ok(Self {
            collective,
            path: path.map(Path::to_path_buf),
            io_handle,
            state: Mutex::new(FacadeState {
                backing,
                registry: BlockRegistry::new(),
            }),
        })
    }

    /// The path this allocator was created with, if any.
    pub fn get_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Allocate `size_bytes`. Peer ranks perform only the broadcast and
    /// return the received value, mutating no local state. The owner
    /// dispatches to the page or heap path under the intra-process lock,
    /// records a [`TrackedBlock`] on success, releases the lock, then
    /// broadcasts the result — including [`crate::NULL_PTR`] on failure, so
    /// peers always progress.
    pub fn allocate(&self, size_bytes: usize) -> VirtualPointer {
        if !self.collective.is_owner() {
            let raw = self.collective.broadcast_u64(NULL_PTR.as_u64());
            return VirtualPointer::new(raw);
        }

        let result = {
            let mut state = self.state.lock().unwrap();
            match state.backing.allocate(size_bytes) {
                Ok(ptr) => {
                    if !ptr.is_null() {
                        state.registry.insert(TrackedBlock {
                            pointer: ptr,
                            size_bytes,
                        });
                        log::debug!("allocate: {size_bytes} bytes -> {ptr:?}");
                    }
                    ptr
                }
                Err(e) => {
                    log::debug!("allocate({size_bytes}) failed: {e}");
                    NULL_PTR
                }
            }
        };

        let raw = self.collective.broadcast_u64(result.as_u64());
        VirtualPointer::new(raw)
    }

    /// Read `buf.len()` bytes from `ptr` into `buf`. Executed locally by
    /// every rank against its own file handle (or process heap); never
    /// takes the intra-process lock.
    pub fn read(&self, ptr: VirtualPointer, buf: &mut [u8]) {
        io::read(&self.io_handle, ptr, buf);
    }

    /// Write `buf` to `ptr`. Symmetric to [`Self::read`].
    pub fn write(&self, ptr: VirtualPointer, buf: &[u8]) {
        io::write(&self.io_handle, ptr, buf);
    }

    /// Release the allocation at `ptr`. No-op on peer ranks. The owner
    /// acquires the lock, looks up the tracked block (must exist), removes
    /// it, and releases the pages or frees the heap region.
    pub fn deallocate(&self, ptr: VirtualPointer) {
        if !self.collective.is_owner() {
            return;
        }
        assert!(!ptr.is_null(), "deallocate of NULL_PTR");
        let mut state = self.state.lock().unwrap();
        deallocate_locked(&mut state, ptr);
    }

    /// Tear down the allocator. Peer ranks only drop local façade state —
    /// no file operations. The owner deallocates every remaining tracked
    /// block, then closes and unlinks the backing file (if any).
    pub fn destroy(self) {
        if !self.collective.is_owner() {
            return;
        }

        let mut state = self.state.into_inner().unwrap();
        for ptr in state.registry.iter_safe_for_removal() {
            deallocate_locked(&mut state, ptr);
        }

        if let Backing::File(pa) = state.backing {
            pa.into_store().close_and_unlink();
        }
    }
}

fn deallocate_locked(state: &mut FacadeState, ptr: VirtualPointer) {
    let block = state
        .registry
        .remove(ptr)
        .unwrap_or_else(|| panic!("deallocate of unknown pointer {ptr:?}"));
    state.backing.deallocate(ptr, block.size_bytes);
}
