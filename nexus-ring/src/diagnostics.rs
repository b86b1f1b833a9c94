//! Wait counters and debug event routing.
//!
//! None of this affects the protocol. Counters are relaxed and cache-line
//! isolated; events are built only when the debug flag is on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_utils::CachePadded;
use tracing::Dispatch;

pub(crate) struct Diagnostics {
    put_waits: CachePadded<AtomicU64>,
    get_waits: CachePadded<AtomicU64>,
    debug: AtomicBool,
    sink: Option<Dispatch>,
}

impl Diagnostics {
    pub(crate) fn new(debug: bool, sink: Option<Dispatch>) -> Self {
        Self {
            put_waits: CachePadded::new(AtomicU64::new(0)),
            get_waits: CachePadded::new(AtomicU64::new(0)),
            debug: AtomicBool::new(debug),
            sink,
        }
    }

    #[inline]
    pub(crate) fn record_put_wait(&self) {
        self.put_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_get_wait(&self) {
        self.get_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn put_waits(&self) -> u64 {
        self.put_waits.load(Ordering::Relaxed)
    }

    pub(crate) fn get_waits(&self) -> u64 {
        self.get_waits.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_counters(&self) {
        self.put_waits.store(0, Ordering::Relaxed);
        self.get_waits.store(0, Ordering::Relaxed);
    }

    /// Sets the debug flag, returning its previous value.
    pub(crate) fn set_debug(&self, enabled: bool) -> bool {
        self.debug.swap(enabled, Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub(crate) const fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Detaches the sink. Returns `false` if none was attached.
    pub(crate) fn close(&mut self) -> bool {
        self.sink.take().is_some()
    }

    /// Runs `event` if the debug flag is on.
    #[inline]
    pub(crate) fn debug(&self, event: impl FnOnce()) {
        if self.is_debug() {
            self.dispatch(event);
        }
    }

    /// Runs `event` regardless of the debug flag.
    #[cold]
    pub(crate) fn alert(&self, event: impl FnOnce()) {
        self.dispatch(event);
    }

    fn dispatch(&self, event: impl FnOnce()) {
        match &self.sink {
            Some(sink) => tracing::dispatcher::with_default(sink, event),
            None => event(),
        }
    }
}
