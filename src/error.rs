// src/error.rs

use thiserror::Error;

/// Error returned when constructing a buffer fails.
///
/// Synchronization primitives in std cannot fail to initialize, so the only
/// fallible step of construction is reserving the ring storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NewError {
    #[error("failed to allocate ring storage for {capacity} slots")]
    Allocation { capacity: usize },
}

/// Failure of an underlying synchronization primitive.
///
/// With std primitives this means the monitor lock was poisoned: some thread
/// panicked while holding it, so the guarded cursors can no longer be
/// trusted. The failure is reported through the buffer's error-report hook
/// before this value is returned; callers must still check the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("synchronization primitive failure: monitor lock poisoned")]
pub struct SyncError;

/// Outcome of a timed operation that did not complete.
///
/// `Timeout` is an expected, retriable condition, distinct from a primitive
/// failure. It is never routed through the error-report hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimedError {
    #[error("deadline elapsed before the buffer became ready")]
    Timeout,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl TimedError {
    /// Returns `true` for the expected, retriable timeout outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimedError::Timeout)
    }
}
