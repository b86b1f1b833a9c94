//! The head/tail cursor pair.
//!
//! Both cursors are monotonically increasing positions; the slot for a
//! position is `position & mask`. One slot is always kept free, so with a
//! ring of `capacity` slots:
//!
//! - empty: `head == tail`
//! - full:  `tail - head == mask` (i.e. `capacity - 1` occupied)
//!
//! Each cursor lives on its own cache line. Producers advance `tail`,
//! consumers (and evicting producers) advance `head`, always by CAS from a
//! snapshotted value, so the winner of the CAS owns that position.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Cursor value marking a buffer that is being reset.
pub(crate) const SENTINEL: u64 = u64::MAX;

/// A point-in-time read of both cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) head: u64,
    pub(crate) tail: u64,
}

impl Snapshot {
    /// Both cursors hold the sentinel: bookkeeping is mid-reset.
    #[inline]
    pub(crate) const fn is_not_ready(self) -> bool {
        self.head == self.tail && self.head == SENTINEL
    }

    #[inline]
    pub(crate) const fn is_empty(self) -> bool {
        self.head == self.tail
    }

    /// `(tail + 1) & mask == head` in position form.
    #[inline]
    pub(crate) const fn is_full(self, mask: u64) -> bool {
        self.tail.wrapping_sub(self.head) >= mask
    }

    /// Occupied slot count, clamped to the usable capacity.
    #[inline]
    pub(crate) fn len(self, mask: u64) -> u64 {
        self.tail.wrapping_sub(self.head).min(mask)
    }
}

/// The shared `head` and `tail` positions.
pub(crate) struct Cursors {
    /// Next position to consume.
    head: CachePadded<AtomicU64>,
    /// Next position to produce.
    tail: CachePadded<AtomicU64>,
}

impl Cursors {
    pub(crate) fn new() -> Self {
        Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Loads `head` then `tail`.
    ///
    /// Reading in this order guarantees `head <= tail` in the snapshot,
    /// since `head` never passes `tail`. The exception is a snapshot taken
    /// while `reset_unsynchronized` runs: between the two sentinel stores it
    /// can pair `head == SENTINEL` with an ordinary `tail`.
    #[inline]
    pub(crate) fn snapshot(&self) -> Snapshot {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Snapshot { head, tail }
    }

    /// Moves `head` from `from` to the next position.
    ///
    /// Returns `true` if this caller now owns position `from`.
    #[inline]
    pub(crate) fn advance_head(&self, from: u64) -> bool {
        self.head
            .compare_exchange(
                from,
                from.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Moves `tail` from `from` to the next position.
    ///
    /// Returns `true` if this caller now owns position `from`.
    #[inline]
    pub(crate) fn advance_tail(&self, from: u64) -> bool {
        self.tail
            .compare_exchange(
                from,
                from.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Stores `position` into `head` and then `tail`.
    #[inline]
    pub(crate) fn store(&self, position: u64) {
        self.head.store(position, Ordering::Release);
        self.tail.store(position, Ordering::Release);
    }
}
