//! Fixed-capacity multi-producer multi-consumer ring buffer.
//!
//! Producers and consumers coordinate through two cursors and a per-slot
//! handshake tag; no lock is taken on any path.
//!
//! Enqueue:
//! 1. snapshot `head`/`tail`; report `Full` or `NotReady` from the snapshot
//! 2. CAS `tail` forward; on failure another producer took the position, so
//!    start over with a fresh snapshot
//! 3. claim the slot `Writable -> WriteClaimed` (waiting out a consumer that
//!    has not released it yet), store the value, commit to `Readable`
//!
//! Dequeue is the mirror image on `head` with `Readable -> ReadClaimed ->
//! Writable`. Winning a cursor CAS assigns the position to the caller for
//! good, so a slow claim is waited out rather than abandoned.
//!
//! Memory layout:
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ head (cache-line padded)                      │
//! ├───────────────────────────────────────────────┤
//! │ tail (cache-line padded)                      │
//! ├───────────────────────────────────────────────┤
//! │ capacity, mask, lifecycle, backoff            │
//! │ put_waits, get_waits (each cache-line padded) │
//! └───────────────────────────────────────────────┘
//! ┌───────────────────────────────────────────────┐
//! │ Slot[0]: { tag, value } (one cache line)      │
//! │ Slot[1]: { tag, value }                       │
//! │ ...                                           │
//! └───────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::hint;

use crossbeam_utils::CachePadded;
use tracing::{debug, warn};

use crate::backoff::Backoff;
use crate::config::Builder;
use crate::cursor::{Cursors, SENTINEL, Snapshot};
use crate::diagnostics::Diagnostics;
use crate::error::{PopError, PushError};
use crate::lifecycle::{self, Direct, ItemLifecycle};
use crate::slot::{Slot, SlotState};

/// A bounded lock-free MPMC queue that rejects values when full.
///
/// All operations take `&self`; share the buffer between threads with an
/// [`Arc`](std::sync::Arc).
///
/// FIFO order holds for a single producer and consumer. Across producers,
/// values are ordered by the position each producer won, and each value is
/// delivered exactly once.
///
/// # Example
///
/// ```
/// use nexus_ring::{PopError, PushError, RingBuffer};
///
/// let rb = RingBuffer::<u32>::new(4);
/// assert_eq!(rb.cap(), 4);
///
/// rb.enqueue(1).unwrap();
/// rb.enqueue(2).unwrap();
/// rb.put(3).unwrap();
/// assert!(matches!(rb.enqueue(4), Err(PushError::Full(4))));
///
/// assert_eq!(rb.dequeue(), Ok(1));
/// assert_eq!(rb.get(), Ok(2));
/// assert_eq!(rb.dequeue(), Ok(3));
/// assert_eq!(rb.dequeue(), Err(PopError::Empty));
/// ```
pub struct RingBuffer<T, L = Direct> {
    pub(crate) cursors: Cursors,
    capacity: usize,
    pub(crate) mask: u64,
    slots: Box<[CachePadded<Slot<T>>]>,
    lifecycle: L,
    backoff: Backoff,
    pub(crate) diagnostics: Diagnostics,
}

impl<T> RingBuffer<T> {
    /// Creates a buffer with at least `capacity` slots and default options.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or its power-of-two rounding overflows.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Builder::new(capacity).build()
    }

    /// Starts configuring a buffer with at least `capacity` slots.
    #[must_use]
    pub fn builder(capacity: usize) -> Builder<T> {
        Builder::new(capacity)
    }
}

impl<T, L: ItemLifecycle<T>> RingBuffer<T, L> {
    pub(crate) fn from_builder(builder: Builder<T, L>) -> Self {
        assert!(builder.capacity > 0, "capacity must be non-zero");
        let capacity = builder
            .capacity
            .checked_next_power_of_two()
            .expect("capacity overflow")
            .max(2);

        let lifecycle = builder.lifecycle;
        let slots = (0..capacity)
            .map(|i| CachePadded::new(Slot::new(lifecycle.preallocate(i))))
            .collect();

        let diagnostics = Diagnostics::new(builder.debug, builder.sink);
        diagnostics.debug(|| {
            debug!(target: "nexus_ring", capacity, requested = builder.capacity, "ring buffer created");
        });

        Self {
            cursors: Cursors::new(),
            capacity,
            mask: capacity as u64 - 1,
            slots,
            lifecycle,
            backoff: builder.backoff,
            diagnostics,
        }
    }

    /// Appends a value at the tail.
    ///
    /// Never blocks: contention on the tail cursor is retried internally, and
    /// a slot still being drained by a consumer is waited out.
    ///
    /// # Errors
    ///
    /// - [`PushError::Full`] if `cap_real()` values are already queued.
    /// - [`PushError::NotReady`] if a reset is in progress.
    /// - [`PushError::Raced`] if the slot's tag was changed under the write
    ///   claim (only a concurrent reset does this).
    pub fn enqueue(&self, item: T) -> Result<(), PushError<T>> {
        loop {
            let snap = self.cursors.snapshot();
            if snap.is_full(self.mask) {
                return Err(PushError::Full(item));
            }
            if snap.is_not_ready() {
                return Err(PushError::NotReady(item));
            }

            if self.cursors.advance_tail(snap.tail) {
                self.write(snap.tail, item)?;
                self.diagnostics.debug(|| {
                    debug!(target: "nexus_ring", tail = snap.tail, head = snap.head, "enqueued");
                });
                return Ok(());
            }

            self.diagnostics.record_put_wait();
            hint::spin_loop();
        }
    }

    /// Alias for [`enqueue`](Self::enqueue).
    ///
    /// # Errors
    ///
    /// See [`enqueue`](Self::enqueue).
    #[inline]
    pub fn put(&self, item: T) -> Result<(), PushError<T>> {
        self.enqueue(item)
    }

    /// Removes the value at the head.
    ///
    /// # Errors
    ///
    /// - [`PopError::Empty`] if no value is queued.
    /// - [`PopError::NotReady`] if a reset is in progress.
    /// - [`PopError::Raced`] if the slot's tag was changed under the read
    ///   claim (only a concurrent reset does this).
    pub fn dequeue(&self) -> Result<T, PopError> {
        loop {
            let snap = self.cursors.snapshot();
            if snap.is_empty() {
                if snap.is_not_ready() {
                    return Err(PopError::NotReady);
                }
                return Err(PopError::Empty);
            }

            if self.cursors.advance_head(snap.head) {
                let value = self.read(snap.head)?;
                self.diagnostics.debug(|| {
                    debug!(
                        target: "nexus_ring",
                        head = snap.head,
                        tail = snap.tail,
                        qty = snap.len(self.mask),
                        "dequeued"
                    );
                });
                return Ok(value);
            }

            self.diagnostics.record_get_wait();
            hint::spin_loop();
        }
    }

    /// Alias for [`dequeue`](Self::dequeue).
    ///
    /// # Errors
    ///
    /// See [`dequeue`](Self::dequeue).
    #[inline]
    pub fn get(&self) -> Result<T, PopError> {
        self.dequeue()
    }

    // === Slot protocol ===

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, position: u64) -> &Slot<T> {
        &self.slots[(position & self.mask) as usize]
    }

    /// Claims `slot` out of the resting state `from`, waiting for its
    /// previous occupant to release it.
    fn claim(&self, slot: &Slot<T>, from: SlotState, record_wait: fn(&Diagnostics)) {
        let mut waiter = self.backoff.start();
        loop {
            match slot.try_claim(from) {
                Ok(()) => return,
                // Spurious failure, the slot is still claimable.
                Err(seen) if seen == from => {}
                Err(_) => {
                    record_wait(&self.diagnostics);
                    waiter.snooze();
                }
            }
        }
    }

    /// Stores `item` at the position this caller won on `tail`.
    pub(crate) fn write(&self, position: u64, item: T) -> Result<(), PushError<T>> {
        let slot = self.slot(position);
        self.claim(slot, SlotState::Writable, Diagnostics::record_put_wait);

        // Safety: we hold the write claim until commit.
        unsafe { lifecycle::store(&self.lifecycle, item, &mut *slot.storage()) };

        slot.commit(SlotState::WriteClaimed).map_err(|seen| {
            self.raced(position, SlotState::WriteClaimed, seen);
            PushError::Raced
        })
    }

    /// Takes the value at the position this caller won on `head`.
    fn read(&self, position: u64) -> Result<T, PopError> {
        let slot = self.slot(position);
        self.claim(slot, SlotState::Readable, Diagnostics::record_get_wait);

        // Safety: we hold the read claim until commit.
        let value = unsafe { lifecycle::extract(&self.lifecycle, &mut *slot.storage()) };

        if let Err(seen) = slot.commit(SlotState::ReadClaimed) {
            self.raced(position, SlotState::ReadClaimed, seen);
            return Err(PopError::Raced);
        }
        value.ok_or_else(|| {
            self.raced(position, SlotState::ReadClaimed, SlotState::Writable);
            PopError::Raced
        })
    }

    /// Drops the value at a position won on `head` by an evicting producer.
    pub(crate) fn discard(&self, position: u64) -> Result<(), SlotState> {
        let slot = self.slot(position);
        self.claim(slot, SlotState::Readable, Diagnostics::record_put_wait);

        // Safety: we hold the read claim until commit.
        drop(unsafe { lifecycle::extract(&self.lifecycle, &mut *slot.storage()) });

        slot.commit(SlotState::ReadClaimed).inspect_err(|&seen| {
            self.raced(position, SlotState::ReadClaimed, seen);
        })
    }

    #[cold]
    fn raced(&self, position: u64, held: SlotState, seen: SlotState) {
        self.diagnostics.alert(|| {
            warn!(target: "nexus_ring", position, ?held, ?seen, "slot tag changed under claim");
        });
    }

    // === Introspection ===

    #[inline]
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.cursors.snapshot()
    }

    /// Realized capacity: the requested capacity rounded up to a power of two.
    #[inline]
    pub const fn cap(&self) -> usize {
        self.capacity
    }

    /// Usable capacity, `cap() - 1`. Also the index mask.
    #[inline]
    pub const fn cap_real(&self) -> usize {
        self.capacity - 1
    }

    /// Number of queued values, from a fresh cursor snapshot.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn size(&self) -> usize {
        self.snapshot().len(self.mask) as usize
    }

    /// Alias for [`size`](Self::size).
    #[inline]
    pub fn quantity(&self) -> usize {
        self.size()
    }

    /// `true` if no value is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// `true` if `cap_real()` values are queued.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.snapshot().is_full(self.mask)
    }

    /// Discards all queued values and rewinds both cursors to 0.
    pub fn reset(&mut self) {
        // Safety: `&mut self` excludes every other access.
        unsafe { self.reset_unsynchronized() }
    }

    /// [`reset`](Self::reset) through a shared reference.
    ///
    /// Parks both cursors on a sentinel (operations that observe it return
    /// `NotReady`), drops queued values, forces every slot back to
    /// `Writable`, then rewinds the cursors to 0.
    ///
    /// # Safety
    ///
    /// No other thread may enqueue, dequeue or format this buffer while the
    /// call runs. This is the one operation that is not safe to race.
    pub unsafe fn reset_unsynchronized(&self) {
        self.cursors.store(SENTINEL);
        for slot in self.slots.iter() {
            if slot.state() == SlotState::Readable {
                // Safety: the caller guarantees no claim is held or taken.
                drop(unsafe { lifecycle::extract(&self.lifecycle, &mut *slot.storage()) });
            }
            slot.force_writable();
        }
        self.cursors.store(0);
        self.diagnostics.debug(|| {
            debug!(target: "nexus_ring", capacity = self.capacity, "reset");
        });
    }

    // === Diagnostics ===

    /// Times a producer had to retry a cursor CAS or wait for a slot.
    pub fn put_waits(&self) -> u64 {
        self.diagnostics.put_waits()
    }

    /// Times a consumer had to retry a cursor CAS or wait for a slot.
    pub fn get_waits(&self) -> u64 {
        self.diagnostics.get_waits()
    }

    /// Zeroes both wait counters.
    pub fn reset_counters(&self) {
        self.diagnostics.reset_counters();
    }

    /// Turns debug events on or off, returning the previous setting.
    pub fn set_debug(&self, enabled: bool) -> bool {
        self.diagnostics.set_debug(enabled)
    }

    /// `true` if debug events are on.
    pub fn is_debug(&self) -> bool {
        self.diagnostics.is_debug()
    }

    /// Detaches the diagnostic sink, if any. Later events go to the global
    /// subscriber. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.diagnostics.close() {
            self.diagnostics.debug(|| {
                debug!(target: "nexus_ring", "diagnostic sink detached");
            });
        }
    }

    /// Calls `f` with every value currently readable, oldest first.
    ///
    /// Each slot is held under a read claim while `f` sees it; slots in the
    /// middle of a handoff are skipped.
    pub(crate) fn peek_each<E>(
        &self,
        snap: Snapshot,
        mut f: impl FnMut(&T) -> Result<(), E>,
    ) -> Result<(), E> {
        for offset in 0..snap.len(self.mask) {
            let position = snap.head.wrapping_add(offset);
            let slot = self.slot(position);
            if slot.try_claim_strong(SlotState::Readable).is_err() {
                continue;
            }
            // Safety: we hold a read claim until restore.
            let result = match unsafe { &*slot.storage() } {
                Some(value) => f(value),
                None => Ok(()),
            };
            self.release_peek(position, slot);
            result?;
        }
        Ok(())
    }

    /// Hands back a read claim taken only to look at the value.
    fn release_peek(&self, position: u64, slot: &Slot<T>) -> bool {
        match slot.restore(SlotState::ReadClaimed) {
            Ok(()) => true,
            Err(seen) => {
                self.raced(position, SlotState::ReadClaimed, seen);
                false
            }
        }
    }
}

/// Formats the live contents as `[a,b,c,]/n`, where `n` is the size.
///
/// Taken from one cursor snapshot; under concurrent use it is only a hint.
impl<T: fmt::Display, L: ItemLifecycle<T>> fmt::Display for RingBuffer<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.snapshot();
        f.write_str("[")?;
        self.peek_each(snap, |value| write!(f, "{value},"))?;
        write!(f, "]/{}", snap.len(self.mask))
    }
}

impl<T, L> fmt::Debug for RingBuffer<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.cursors.snapshot();
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("head", &snap.head)
            .field("tail", &snap.tail)
            .field("put_waits", &self.diagnostics.put_waits())
            .field("get_waits", &self.diagnostics.get_waits())
            .field("sink", &self.diagnostics.has_sink())
            .finish_non_exhaustive()
    }
}
