//! Ring buffer that evicts its oldest value instead of rejecting new ones.
//!
//! Producers never see `Full`. When the buffer holds `cap_real()` values, a
//! producer first wins `head` for the oldest position, drains that slot under
//! a read claim and drops the value, then retries its own write. A consumer
//! racing the eviction for the same position loses the `head` CAS and moves
//! on, so every value is either delivered once or evicted once.
//!
//! Useful for "latest N" buffers: telemetry tails, last-known quotes, recent
//! log lines.

use std::fmt;
use std::hint;

use tracing::debug;

use crate::config::Builder;
use crate::error::{PopError, PushError};
use crate::lifecycle::{Direct, ItemLifecycle};
use crate::ring::RingBuffer;

/// Outcome of [`OverwritingRingBuffer::enqueue_overwriting_rich`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// Values this call evicted to make room.
    pub evicted: usize,
    /// Occupied size right after this value was placed.
    pub size: usize,
}

/// A bounded lock-free MPMC queue that drops the oldest value when full.
///
/// # Example
///
/// ```
/// use nexus_ring::OverwritingRingBuffer;
///
/// let rb = OverwritingRingBuffer::<u32>::new(4);
/// for i in 0..3 {
///     assert_eq!(rb.enqueue_overwriting(i).unwrap(), 0);
/// }
///
/// // Full: the next value evicts 0.
/// assert_eq!(rb.enqueue_overwriting(3).unwrap(), 1);
/// assert_eq!(rb.to_string(), "[1,2,3,]/3");
///
/// assert_eq!(rb.dequeue(), Ok(1));
/// ```
pub struct OverwritingRingBuffer<T, L = Direct> {
    inner: RingBuffer<T, L>,
}

impl<T> OverwritingRingBuffer<T> {
    /// Creates a buffer with at least `capacity` slots and default options.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or its power-of-two rounding overflows.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Builder::new(capacity).build_overwriting()
    }

    /// Starts configuring a buffer; finish with
    /// [`Builder::build_overwriting`].
    #[must_use]
    pub fn builder(capacity: usize) -> Builder<T> {
        Builder::new(capacity)
    }
}

impl<T, L: ItemLifecycle<T>> OverwritingRingBuffer<T, L> {
    pub(crate) const fn from_ring(inner: RingBuffer<T, L>) -> Self {
        Self { inner }
    }

    /// Appends a value, evicting the oldest ones as needed.
    ///
    /// Returns the number of values this call evicted: 0 when there was
    /// room, 1 when the buffer was full. Under concurrent producers a call
    /// may evict more than once if others refill the space it freed.
    ///
    /// # Errors
    ///
    /// - [`PushError::NotReady`] if a reset is in progress.
    /// - [`PushError::Raced`] if the slot's tag was changed under the write
    ///   claim (only a concurrent reset does this).
    #[inline]
    pub fn enqueue_overwriting(&self, item: T) -> Result<usize, PushError<T>> {
        self.enqueue_overwriting_rich(item).map(|done| done.evicted)
    }

    /// [`enqueue_overwriting`](Self::enqueue_overwriting), also reporting
    /// the occupied size right after the value was placed.
    ///
    /// # Errors
    ///
    /// See [`enqueue_overwriting`](Self::enqueue_overwriting).
    pub fn enqueue_overwriting_rich(&self, item: T) -> Result<Enqueued, PushError<T>> {
        let ring = &self.inner;
        let mut evicted = 0;

        loop {
            let snap = ring.snapshot();
            if snap.is_not_ready() {
                return Err(PushError::NotReady(item));
            }

            if snap.is_full(ring.mask) {
                if ring.cursors.advance_head(snap.head) {
                    if ring.discard(snap.head).is_err() {
                        return Err(PushError::NotReady(item));
                    }
                    evicted += 1;
                    ring.diagnostics.debug(|| {
                        debug!(target: "nexus_ring", head = snap.head, tail = snap.tail, "evicted oldest");
                    });
                } else {
                    ring.diagnostics.record_put_wait();
                    hint::spin_loop();
                }
                continue;
            }

            if ring.cursors.advance_tail(snap.tail) {
                ring.write(snap.tail, item)?;
                #[allow(clippy::cast_possible_truncation)]
                let size = snap.len(ring.mask) as usize + 1;
                ring.diagnostics.debug(|| {
                    debug!(target: "nexus_ring", tail = snap.tail, size, evicted, "enqueued");
                });
                return Ok(Enqueued { evicted, size });
            }

            ring.diagnostics.record_put_wait();
            hint::spin_loop();
        }
    }

    /// Appends a value, evicting the oldest one if full.
    ///
    /// # Errors
    ///
    /// See [`enqueue_overwriting`](Self::enqueue_overwriting).
    #[inline]
    pub fn enqueue(&self, item: T) -> Result<(), PushError<T>> {
        self.enqueue_overwriting_rich(item).map(|_| ())
    }

    /// Alias for [`enqueue`](Self::enqueue).
    ///
    /// # Errors
    ///
    /// See [`enqueue_overwriting`](Self::enqueue_overwriting).
    #[inline]
    pub fn put(&self, item: T) -> Result<(), PushError<T>> {
        self.enqueue(item)
    }

    /// Removes the value at the head.
    ///
    /// # Errors
    ///
    /// See [`RingBuffer::dequeue`].
    #[inline]
    pub fn dequeue(&self) -> Result<T, PopError> {
        self.inner.dequeue()
    }

    /// Alias for [`dequeue`](Self::dequeue).
    ///
    /// # Errors
    ///
    /// See [`RingBuffer::dequeue`].
    #[inline]
    pub fn get(&self) -> Result<T, PopError> {
        self.inner.dequeue()
    }

    /// Realized capacity.
    #[inline]
    pub const fn cap(&self) -> usize {
        self.inner.cap()
    }

    /// Usable capacity, `cap() - 1`.
    #[inline]
    pub const fn cap_real(&self) -> usize {
        self.inner.cap_real()
    }

    /// Number of queued values.
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Alias for [`size`](Self::size).
    #[inline]
    pub fn quantity(&self) -> usize {
        self.inner.size()
    }

    /// `true` if no value is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// `true` if the next enqueue will evict.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Discards all queued values and rewinds both cursors to 0.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// See [`RingBuffer::reset_unsynchronized`].
    ///
    /// # Safety
    ///
    /// No other thread may use this buffer while the call runs.
    pub unsafe fn reset_unsynchronized(&self) {
        // Safety: forwarded from the caller.
        unsafe { self.inner.reset_unsynchronized() }
    }

    /// Detaches the diagnostic sink, if any.
    pub fn close(&mut self) {
        self.inner.close();
    }

    /// Turns debug events on or off, returning the previous setting.
    pub fn set_debug(&self, enabled: bool) -> bool {
        self.inner.set_debug(enabled)
    }

    /// `true` if debug events are on.
    pub fn is_debug(&self) -> bool {
        self.inner.is_debug()
    }

    /// Times a producer had to retry or wait, evictions included.
    pub fn put_waits(&self) -> u64 {
        self.inner.put_waits()
    }

    /// Times a consumer had to retry or wait.
    pub fn get_waits(&self) -> u64 {
        self.inner.get_waits()
    }

    /// Zeroes both wait counters.
    pub fn reset_counters(&self) {
        self.inner.reset_counters();
    }
}

impl<T: fmt::Display, L: ItemLifecycle<T>> fmt::Display for OverwritingRingBuffer<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl<T, L> fmt::Debug for OverwritingRingBuffer<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OverwritingRingBuffer").field(&self.inner).finish()
    }
}
