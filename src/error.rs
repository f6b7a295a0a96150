//! Error taxonomy for fallible allocator operations.
///
/// `IOFailure` and `InvariantViolation` from the design's error taxonomy are
/// not represented here: short/failing positional I/O and programming-error
/// conditions (null pointer, unaligned pointer, unknown pointer) have no
/// recovery defined and are enforced with `panic!`/`assert!` at the call
/// site instead of being threaded through `Result`.
use std::fmt;
use std::io;

/// Failure surfaced from [`crate::Allocator::create`], and internally from
/// `allocate` (where it collapses to [`crate::NULL_PTR`] instead of
/// propagating, per the design's "peers still observe the broadcast" rule).
#[derive(Debug)]
pub enum AllocError {
    /// In-process bookkeeping (registry node, bitmap buffer, heap region)
    /// could not be allocated.
    AllocationFailure,
    /// Growing the backing file (`set_len` / bitmap resize) failed.
    FileGrowthFailure(io::Error),
    /// `create` could not open, truncate, or otherwise initialize the
    /// backing file.
    CreationFailure(io::Error),
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::AllocationFailure => write!(f, "out of memory for allocator bookkeeping"),
            AllocError::FileGrowthFailure(e) => write!(f, "failed to grow backing file: {e}"),
            AllocError::CreationFailure(e) => write!(f, "failed to create allocator: {e}"),
        }
    }
}

impl std::error::Error for AllocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocError::FileGrowthFailure(e) | AllocError::CreationFailure(e) => Some(e),
            AllocError::AllocationFailure => None,
        }
    }
}
