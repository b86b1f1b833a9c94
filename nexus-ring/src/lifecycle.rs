//! Pluggable slot storage lifecycle.
//!
//! By default a slot holds the value it was given and hands it back by
//! move ([`Direct`]). A buffer of heavy values can instead keep one storage
//! object per slot for its whole life: the lifecycle pre-allocates it at
//! construction, copies published values into it, and copies them back out
//! while leaving the storage ready for the next lap.
//!
//! # Example
//!
//! ```
//! use nexus_ring::{RingBuffer, lifecycle::VecPool};
//!
//! let rb = RingBuffer::<Vec<u8>>::builder(4)
//!     .lifecycle(VecPool::new(256))
//!     .build();
//!
//! rb.enqueue(b"hello".to_vec()).unwrap();
//! assert_eq!(rb.dequeue().unwrap(), b"hello");
//! ```

/// Strategy controlling how values enter and leave slot storage.
///
/// Every method has a default equivalent to plain assignment, so a pooling
/// implementation overrides only what it needs. Implementations are shared
/// by all slots and must not depend on which buffer position they serve.
pub trait ItemLifecycle<T>: Send + Sync {
    /// Initial storage for slot `index`, created once at construction.
    ///
    /// `None` leaves the slot without backing storage until the first
    /// value is published into it.
    fn preallocate(&self, index: usize) -> Option<T> {
        let _ = index;
        None
    }

    /// Publishes `source` into existing slot storage.
    fn clone_in(&self, source: T, target: &mut T) {
        *target = source;
    }

    /// Extracts the published value from slot storage.
    ///
    /// Return `Some` to keep the storage in the slot for reuse (leaving it
    /// in whatever reusable state the pool wants). Return `None` to move the
    /// storage itself out to the caller.
    fn clone_out(&self, source: &mut T) -> Option<T> {
        let _ = source;
        None
    }
}

/// Assign on publish, move on extract. No pooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Direct;

impl<T> ItemLifecycle<T> for Direct {}

/// Pools one `Vec<E>` per slot.
///
/// Published vectors are moved element-wise into the slot's own allocation,
/// and consumers receive a copy while the slot's vector is cleared and kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VecPool {
    capacity: usize,
}

impl VecPool {
    /// Each slot pre-allocates room for `capacity` elements.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl<E: Clone + Send> ItemLifecycle<Vec<E>> for VecPool {
    fn preallocate(&self, _index: usize) -> Option<Vec<E>> {
        Some(Vec::with_capacity(self.capacity))
    }

    fn clone_in(&self, source: Vec<E>, target: &mut Vec<E>) {
        target.clear();
        target.extend(source);
    }

    fn clone_out(&self, source: &mut Vec<E>) -> Option<Vec<E>> {
        let out = source.clone();
        source.clear();
        Some(out)
    }
}

/// Publishes `item` into a slot's storage.
#[inline]
pub(crate) fn store<T, L: ItemLifecycle<T>>(lifecycle: &L, item: T, storage: &mut Option<T>) {
    match storage {
        Some(target) => lifecycle.clone_in(item, target),
        None => *storage = Some(item),
    }
}

/// Extracts the value from a slot's storage.
///
/// `None` means the storage held nothing, which a readable slot never does.
#[inline]
pub(crate) fn extract<T, L: ItemLifecycle<T>>(lifecycle: &L, storage: &mut Option<T>) -> Option<T> {
    let pooled = storage.as_mut().and_then(|stored| lifecycle.clone_out(stored));
    if pooled.is_some() {
        return pooled;
    }
    storage.take()
}
