//! Page-granular allocator: combines the [`Bitmap`] free-space map with a
//! [`FileStore`]-backed address space.
use crate::bitmap::Bitmap;
use crate::error::AllocError;
use crate::file_store::FileStore;
use crate::pointer::{VirtualPointer, NULL_PTR};
use crate::PAGE_SIZE;

pub struct PageAllocator {
    store: FileStore,
    bitmap: Bitmap,
}

impl PageAllocator {
    pub fn new(store: FileStore) -> Self {
        let page_count = (store.file_bytes() / PAGE_SIZE) as usize;
        Self {
            store,
            bitmap: Bitmap::new(page_count),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn into_store(self) -> FileStore {
        self.store
    }

    /// `n = ceil(size_bytes / PAGE_SIZE)`. Retries after growing the file
    /// and bitmap until a contiguous run of `n` free pages is found.
    /// `size_bytes == 0` returns [`NULL_PTR`] without touching any state.
    pub fn allocate(&mut self, size_bytes: usize) -> Result<VirtualPointer, AllocError> {
        if size_bytes == 0 {
            return Ok(NULL_PTR);
        }
        let n = size_bytes.div_ceil(PAGE_SIZE as usize);

        loop {
            if let Some(start_page) = self.bitmap.find_first_clear(n) {
                let offset = start_page as u64 * PAGE_SIZE;
                return Ok(VirtualPointer::new(offset));
            }
            self.store.grow()?;
            self.bitmap.resize((self.store.file_bytes() / PAGE_SIZE) as usize);
        }
    }

    /// Clears the half-open page range `[start, start+count)` where
    /// `count = ceil(size_bytes / PAGE_SIZE)`. The naive `(size-1)/PAGE_SIZE`
    /// form undercounts by one page for exact multiples of `PAGE_SIZE` and
    /// must not be used.
    pub fn deallocate(&mut self, ptr: VirtualPointer, size_bytes: usize) {
        assert!(
            ptr.as_u64() % PAGE_SIZE == 0,
            "deallocate of unaligned pointer {ptr:?}"
        );
        let start = (ptr.as_u64() / PAGE_SIZE) as usize;
        let count = size_bytes.div_ceil(PAGE_SIZE as usize);
        self.bitmap.clear_range(start, start + count);
    }
}
