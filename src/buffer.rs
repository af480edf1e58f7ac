// src/buffer.rs

use std::mem::MaybeUninit;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::{NewError, SyncError, TimedError};
use crate::handle::Handle;
use crate::report::{ErrorReport, stderr_report};

/// The ring state guarded by the monitor lock: storage plus both cursors.
///
/// Invariants (re-established before every unlock):
/// - `write < capacity` and `read < capacity`;
/// - slots in `[read, write)` modulo capacity are initialized;
/// - `read == write` means empty. Because cursor equality is the only empty
///   signal, one slot is kept in reserve to distinguish full from empty:
///   the ring is full at `len() == capacity - 1` and never legally reaches
///   `len() == capacity`.
struct Ring<T> {
    slots: Box<[MaybeUninit<T>]>,
    /// Position of the next slot to write.
    write: usize,
    /// Position of the next slot to read.
    read: usize,
}

impl<T: Handle> Ring<T> {
    fn with_capacity(capacity: usize) -> Result<Self, NewError> {
        let mut slots: Vec<MaybeUninit<T>> = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| NewError::Allocation { capacity })?;
        slots.resize_with(capacity, MaybeUninit::uninit);

        Ok(Ring {
            slots: slots.into_boxed_slice(),
            write: 0,
            read: 0,
        })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live item count, computed from the cursors.
    ///
    /// Always the modulo formula, never a cached counter, so it is correct
    /// at every cursor configuration, including the wrap where `write` has
    /// just reset to 0 while `read` is nonzero.
    #[inline]
    fn len(&self) -> usize {
        (self.write + self.capacity() - self.read) % self.capacity()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.read == self.write
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len() == self.capacity() - 1
    }

    fn check_cursors(&self) {
        debug_assert!(self.write < self.capacity(), "write cursor out of range");
        debug_assert!(self.read < self.capacity(), "read cursor out of range");
    }

    fn push(&mut self, item: T) {
        debug_assert!(!self.is_full(), "push on a full ring");
        self.slots[self.write].write(item);
        self.write = (self.write + 1) % self.capacity();
    }

    fn pop(&mut self) -> T {
        debug_assert!(!self.is_empty(), "pop on an empty ring");
        // SAFETY: the ring is non-empty, so the slot at `read` lies in
        // `[read, write)` and is initialized.
        let item = unsafe { self.slots[self.read].assume_init_read() };
        self.read = (self.read + 1) % self.capacity();
        item
    }
}

/// A thread-safe bounded circular buffer of item handles.
///
/// The buffer is a classic monitor: one mutex serializes all access to the
/// ring storage and cursors, and two condition variables ("not full", "not
/// empty") are the only suspension points. Producers block in [`put`] while
/// the ring is saturated; consumers block in [`get`] while it is empty. The
/// timed variants bound that wait by an absolute deadline and return
/// [`TimedError::Timeout`] instead of suspending indefinitely.
///
/// One slot is kept in reserve to disambiguate full from empty without a
/// separate counter, so a buffer constructed with `capacity` slots holds at
/// most `capacity - 1` items at once (see [`usable_capacity`]).
///
/// Items are opaque [`Handle`] values: the buffer stores and hands back
/// handles, never touching whatever they refer to.
///
/// [`put`]: BoundedBuffer::put
/// [`get`]: BoundedBuffer::get
/// [`usable_capacity`]: BoundedBuffer::usable_capacity
pub struct BoundedBuffer<T: Handle> {
    /// Raw slot count, fixed for the buffer's lifetime.
    capacity: usize,
    /// Monitor lock guarding storage and both cursors.
    ring: Mutex<Ring<T>>,
    /// Producers wait here while the ring is full.
    not_full: Condvar,
    /// Consumers wait here while the ring is empty.
    not_empty: Condvar,
    /// Diagnostics hook for synchronization-primitive failures.
    report: ErrorReport,
}

impl<T: Handle> BoundedBuffer<T> {
    /// Creates a buffer with `capacity` slots and the default stderr
    /// error reporter.
    ///
    /// # Panics
    /// Panics if `capacity` is 0 (a contract violation, not a runtime
    /// error).
    pub fn new(capacity: usize) -> Result<Self, NewError> {
        Self::with_error_report(capacity, stderr_report())
    }

    /// Creates a buffer with `capacity` slots and an injected error-report
    /// hook.
    ///
    /// The hook is invoked with a human-readable message whenever an
    /// internal synchronization primitive fails; timeouts are expected
    /// outcomes and never pass through it.
    pub fn with_error_report(capacity: usize, report: ErrorReport) -> Result<Self, NewError> {
        assert!(capacity > 0, "Bounded buffer capacity must be greater than 0");

        Ok(BoundedBuffer {
            capacity,
            ring: Mutex::new(Ring::with_capacity(capacity)?),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            report,
        })
    }

    /// Raw slot count the buffer was constructed with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum number of items the buffer can hold at once: one less than
    /// [`capacity`](BoundedBuffer::capacity), per the reserved-slot scheme.
    pub fn usable_capacity(&self) -> usize {
        self.capacity - 1
    }

    /// Current item count.
    ///
    /// Advisory snapshot: the value may be stale immediately after return
    /// under concurrent mutation. Callers needing a consistent
    /// check-then-act must use the blocking or timed operations instead.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns `true` if the buffer currently holds no items. Snapshot
    /// semantics as for [`len`](BoundedBuffer::len).
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Returns `true` if the buffer currently holds
    /// [`usable_capacity`](BoundedBuffer::usable_capacity) items. Snapshot
    /// semantics as for [`len`](BoundedBuffer::len).
    pub fn is_full(&self) -> bool {
        self.snapshot().is_full()
    }

    /// Blocking enqueue.
    ///
    /// Waits on "not full" while the ring is saturated (in a loop, so
    /// spurious wakeups and multi-waiter races re-check the predicate),
    /// stores the handle, advances the write cursor, and wakes one waiting
    /// consumer.
    ///
    /// # Returns
    /// `Ok(())` on success, or [`SyncError`] if a primitive fails; every
    /// failure path releases the lock before returning.
    pub fn put(&self, item: T) -> Result<(), SyncError> {
        let mut ring = self.lock_ring("put")?;
        ring.check_cursors();

        while ring.is_full() {
            ring = self
                .not_full
                .wait(ring)
                .map_err(|_| self.sync_failure("put", "condition wait"))?;
        }

        ring.push(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Deadline-bounded enqueue.
    ///
    /// Identical to [`put`](BoundedBuffer::put) except the wait is bounded:
    /// an absolute deadline is fixed on first entry into the wait loop and
    /// never recomputed on spurious wakeups, so a busy buffer cannot
    /// stretch the caller's budget. A zero `timeout` is an already-expired
    /// deadline, not an unbounded wait.
    ///
    /// # Returns
    /// `Ok(())` on success; [`TimedError::Timeout`] if the deadline elapsed
    /// while the ring stayed full (nothing inserted, lock released);
    /// [`TimedError::Sync`] if a primitive fails.
    pub fn timed_put(&self, item: T, timeout: Duration) -> Result<(), TimedError> {
        let mut ring = self.lock_ring("timed_put")?;
        ring.check_cursors();

        let mut deadline = None;
        while ring.is_full() {
            // Fixed once, on the first pass through the wait loop.
            let due = *deadline.get_or_insert_with(|| Instant::now() + timeout);
            let remaining = due.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TimedError::Timeout);
            }

            let (guard, wait) = self
                .not_full
                .wait_timeout(ring, remaining)
                .map_err(|_| self.sync_failure("timed_put", "condition wait"))?;
            ring = guard;

            if wait.timed_out() && ring.is_full() {
                return Err(TimedError::Timeout);
            }
        }

        ring.push(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocking dequeue.
    ///
    /// Waits on "not empty" while the ring holds no items, then reads the
    /// handle at the read cursor, advances the cursor, and wakes one
    /// waiting producer.
    ///
    /// # Returns
    /// The dequeued handle, or [`SyncError`] if a primitive fails; every
    /// failure path releases the lock before returning.
    pub fn get(&self) -> Result<T, SyncError> {
        let mut ring = self.lock_ring("get")?;
        ring.check_cursors();

        while ring.is_empty() {
            ring = self
                .not_empty
                .wait(ring)
                .map_err(|_| self.sync_failure("get", "condition wait"))?;
        }

        let item = ring.pop();
        self.not_full.notify_one();
        Ok(item)
    }

    /// Deadline-bounded dequeue, symmetric to
    /// [`timed_put`](BoundedBuffer::timed_put).
    ///
    /// # Returns
    /// The dequeued handle; [`TimedError::Timeout`] if the deadline elapsed
    /// while the ring stayed empty (nothing removed, lock released);
    /// [`TimedError::Sync`] if a primitive fails.
    pub fn timed_get(&self, timeout: Duration) -> Result<T, TimedError> {
        let mut ring = self.lock_ring("timed_get")?;
        ring.check_cursors();

        let mut deadline = None;
        while ring.is_empty() {
            let due = *deadline.get_or_insert_with(|| Instant::now() + timeout);
            let remaining = due.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TimedError::Timeout);
            }

            let (guard, wait) = self
                .not_empty
                .wait_timeout(ring, remaining)
                .map_err(|_| self.sync_failure("timed_get", "condition wait"))?;
            ring = guard;

            if wait.timed_out() && ring.is_empty() {
                return Err(TimedError::Timeout);
            }
        }

        let item = ring.pop();
        self.not_full.notify_one();
        Ok(item)
    }

    /// Acquires the monitor lock, routing a poisoned lock through the
    /// error-report hook.
    fn lock_ring(&self, op: &str) -> Result<MutexGuard<'_, Ring<T>>, SyncError> {
        self.ring
            .lock()
            .map_err(|_| self.sync_failure(op, "mutex lock"))
    }

    /// Best-effort state access for the introspection snapshots: a
    /// poisoned lock still yields the cursors rather than failing, since
    /// the returned values are advisory anyway.
    fn snapshot(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sync_failure(&self, op: &str, primitive: &str) -> SyncError {
        (self.report)(&format!("{op}: {primitive} found the monitor lock poisoned"));
        SyncError
    }
}
