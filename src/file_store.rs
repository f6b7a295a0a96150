//! Owns the backing file descriptor and its logical byte length.
//!
//! Positional I/O uses `FileExt::read_at`/`write_at` on Unix
//! (`std::os::unix::fs::FileExt`), `seek_read`/`seek_write` on Windows,
//! rather than a seek-then-read/write pair that would race against
//! concurrent callers. The underlying `File` is kept behind an `Arc` so the
//! façade can hand out a lock-free clone for `read`/`write` while `grow`
//! stays behind the façade's mutex: positional I/O must never block on the
//! same lock that guards the bitmap.
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

use crate::error::AllocError;
use crate::{GROW_SIZE, PAGE_SIZE};

pub struct FileStore {
    file: Arc<File>,
    path: PathBuf,
    file_bytes: u64,
}

impl FileStore {
    /// Create the backing file, truncated to one page (the owner rank's
    /// path through `create`).
    pub fn create(path: &Path) -> Result<Self, AllocError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(AllocError::CreationFailure)?;
        file.set_len(PAGE_SIZE).map_err(AllocError::CreationFailure)?;
        Ok(Self {
            file: Arc::new(file),
            path: path.to_path_buf(),
            file_bytes: PAGE_SIZE,
        })
    }

    /// Open an existing backing file read-write (a peer rank's path through
    /// `create`, after the startup barrier guarantees the owner has
    /// already created it).
    pub fn open_existing(path: &Path) -> Result<Self, AllocError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(AllocError::CreationFailure)?;
        let file_bytes = file.metadata().map_err(AllocError::CreationFailure)?.len();
        Ok(Self {
            file: Arc::new(file),
            path: path.to_path_buf(),
            file_bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_bytes(&self) -> u64 {
        self.file_bytes
    }

    /// A lock-free clone of the file handle, for the façade's `read`/`write`
    /// path which must not contend with the allocate/grow mutex.
    pub(crate) fn file_handle(&self) -> Arc<File> {
        Arc::clone(&self.file)
    }

    /// Double `file_bytes` while it's at or below `GROW_SIZE`, otherwise add
    /// `GROW_SIZE` flat. Extends the on-disk length to match. A no-fail
    /// contract for the truncation itself: if the OS rejects it, the error
    /// surfaces as `AllocError::FileGrowthFailure` and no state changes.
    pub fn grow(&mut self) -> Result<(), AllocError> {
        let new_bytes = if self.file_bytes <= GROW_SIZE {
            self.file_bytes * 2
        } else {
            self.file_bytes + GROW_SIZE
        };
        self.file
            .set_len(new_bytes)
            .map_err(AllocError::FileGrowthFailure)?;
        self.file_bytes = new_bytes;
        log::debug!("grew backing file {} -> {new_bytes} bytes", self.path.display());
        Ok(())
    }

    /// Positional read of exactly `buf.len()` bytes at `offset`. Short reads
    /// are treated as fatal — no partial-success semantics are defined.
    pub fn pread_exact(&self, offset: u64, buf: &mut [u8]) {
        pread_exact(&self.file, offset, buf);
    }

    /// Positional write of exactly `buf.len()` bytes at `offset`. Short
    /// writes are treated as fatal.
    pub fn pwrite_exact(&self, offset: u64, buf: &[u8]) {
        pwrite_exact(&self.file, offset, buf);
    }

    /// Close and unlink the backing file. Best-effort: errors are logged,
    /// not propagated, matching `destroy`'s contract.
    pub fn close_and_unlink(self) {
        let path = self.path.clone();
        drop(self.file);
        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("failed to unlink backing file {}: {e}", path.display());
        }
    }
}

/// Positional read of exactly `buf.len()` bytes at `offset`, fatal on
/// short/failing I/O. Free function so the façade's lock-free `Arc<File>`
/// handle can share this logic without going through [`FileStore`].
pub(crate) fn pread_exact(file: &File, offset: u64, buf: &mut [u8]) {
    if let Err(e) = read_at_exact(file, offset, buf) {
        panic!(
            "fatal short/failing read at offset {offset} of {} bytes: {e}",
            buf.len()
        );
    }
}

pub(crate) fn pwrite_exact(file: &File, offset: u64, buf: &[u8]) {
    if let Err(e) = write_at_exact(file, offset, buf) {
        panic!(
            "fatal short/failing write at offset {offset} of {} bytes: {e}",
            buf.len()
        );
    }
}

#[cfg(unix)]
fn read_at_exact(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_at_exact(file: &File, offset: u64, buf: &[u8]) -> io::Result<()> {
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn read_at_exact(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    let mut off = offset;
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.seek_read(&mut buf[filled..], off)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
        }
        filled += n;
        off += n as u64;
    }
    Ok(())
}

#[cfg(windows)]
fn write_at_exact(file: &File, offset: u64, buf: &[u8]) -> io::Result<()> {
    let mut off = offset;
    let mut written = 0;
    while written < buf.len() {
        let n = file.seek_write(&buf[written..], off)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
        }
        written += n;
        off += n as u64;
    }
    Ok(())
}
