//! Construction options.

use std::fmt;
use std::marker::PhantomData;

use tracing::Dispatch;

use crate::backoff::Backoff;
use crate::lifecycle::{Direct, ItemLifecycle};
use crate::overwriting::OverwritingRingBuffer;
use crate::ring::RingBuffer;

/// Configures and builds a ring buffer.
///
/// Obtained from [`RingBuffer::builder`] or [`OverwritingRingBuffer::builder`].
/// The terminal method picks the full-buffer policy: [`build`](Self::build)
/// rejects new values, [`build_overwriting`](Self::build_overwriting) evicts
/// the oldest one.
///
/// # Example
///
/// ```
/// use nexus_ring::{Backoff, RingBuffer};
///
/// let rb = RingBuffer::<u64>::builder(100)
///     .debug(true)
///     .backoff(Backoff::new().spin_limit(4))
///     .build();
///
/// assert_eq!(rb.cap(), 128);
/// assert_eq!(rb.cap_real(), 127);
/// ```
pub struct Builder<T, L = Direct> {
    pub(crate) capacity: usize,
    pub(crate) debug: bool,
    pub(crate) lifecycle: L,
    pub(crate) sink: Option<Dispatch>,
    pub(crate) backoff: Backoff,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Builder<T, Direct> {
    /// Starts a builder for at least `capacity` slots.
    ///
    /// The realized capacity is the next power of two (minimum 2), and one
    /// slot stays reserved, so `capacity - 1` values fit.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            debug: false,
            lifecycle: Direct,
            sink: None,
            backoff: Backoff::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, L: ItemLifecycle<T>> Builder<T, L> {
    /// Emits a `tracing` event for every enqueue, dequeue and eviction.
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Pools slot storage through `lifecycle`.
    #[must_use]
    pub fn lifecycle<L2: ItemLifecycle<T>>(self, lifecycle: L2) -> Builder<T, L2> {
        Builder {
            capacity: self.capacity,
            debug: self.debug,
            lifecycle,
            sink: self.sink,
            backoff: self.backoff,
            _marker: PhantomData,
        }
    }

    /// Routes this buffer's events to `sink` instead of the global default
    /// subscriber.
    #[must_use]
    pub fn sink(mut self, sink: impl Into<Dispatch>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    /// Replaces the wait schedule used under slot contention.
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Builds a buffer that rejects values when full.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is 0 or its power-of-two rounding overflows.
    #[must_use]
    pub fn build(self) -> RingBuffer<T, L> {
        RingBuffer::from_builder(self)
    }

    /// Builds a buffer that evicts its oldest value when full.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is 0 or its power-of-two rounding overflows.
    #[must_use]
    pub fn build_overwriting(self) -> OverwritingRingBuffer<T, L> {
        OverwritingRingBuffer::from_ring(RingBuffer::from_builder(self))
    }
}

impl<T, L> fmt::Debug for Builder<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("capacity", &self.capacity)
            .field("debug", &self.debug)
            .field("sink", &self.sink.is_some())
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
