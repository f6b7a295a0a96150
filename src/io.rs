//! Single dispatch point for reads/writes: given a pointer and a direction,
//! choose positional file I/O or a heap `memcpy`. Isolates the file/heap
//! dichotomy from the façade, and — critically — never takes the façade's
//! allocate/grow mutex: a `File` handle's `read_at`/`write_at` need only
//! `&File`, so concurrent, disjoint-region I/O never blocks on bitmap
//! bookkeeping.
use std::fs::File;
use std::sync::Arc;

use crate::file_store::{pread_exact, pwrite_exact};
use crate::heap_allocator::HeapAllocator;
use crate::pointer::VirtualPointer;

/// Where a façade's regions live: a shared file handle, or the process
/// heap. Held outside the façade's mutex so `read`/`write` are lock-free.
pub(crate) enum IoHandle {
    File(Arc<File>),
    Heap,
}

pub(crate) fn read(handle: &IoHandle, ptr: VirtualPointer, buf: &mut [u8]) {
    assert!(!ptr.is_null(), "read of NULL_PTR");
    match handle {
        IoHandle::File(file) => pread_exact(file, ptr.as_u64(), buf),
        IoHandle::Heap => HeapAllocator::new().read(ptr, buf),
    }
}

pub(crate) fn write(handle: &IoHandle, ptr: VirtualPointer, buf: &[u8]) {
    assert!(!ptr.is_null(), "write of NULL_PTR");
    match handle {
        IoHandle::File(file) => pwrite_exact(file, ptr.as_u64(), buf),
        IoHandle::Heap => HeapAllocator::new().write(ptr, buf),
    }
}
