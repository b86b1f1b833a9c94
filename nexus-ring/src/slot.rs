//! A single storage cell of the ring and its handshake tag.
//!
//! Every slot carries a 4-state tag. Producers and consumers never touch the
//! value without first moving the tag out of a resting state with a CAS, so
//! the tag is the only synchronization device for the cell:
//!
//! ```text
//!            claim               commit
//! Writable ─────────▶ WriteClaimed ─────────▶ Readable
//!    ▲                                          │
//!    │     commit                claim          │
//!    └──────────── ReadClaimed ◀────────────────┘
//! ```
//!
//! A claim taken only to inspect the value (see the `Display` snapshot) is
//! handed back with `restore`, which returns the slot to the resting state it
//! was claimed from.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};

/// Handshake state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum SlotState {
    /// Empty, a producer may claim it.
    Writable = 0,
    /// Holds a published value, a consumer may claim it.
    Readable = 1,
    /// A producer is writing the value.
    WriteClaimed = 2,
    /// A consumer is extracting the value.
    ReadClaimed = 3,
}

impl SlotState {
    #[inline]
    const fn from_tag(tag: u8) -> Self {
        match tag & 0b11 {
            0 => Self::Writable,
            1 => Self::Readable,
            2 => Self::WriteClaimed,
            _ => Self::ReadClaimed,
        }
    }

    #[inline]
    const fn tag(self) -> u8 {
        self as u8
    }

    /// State entered by claiming a slot resting in `self`.
    #[inline]
    pub(crate) const fn claimed(self) -> Option<Self> {
        match self {
            Self::Writable => Some(Self::WriteClaimed),
            Self::Readable => Some(Self::ReadClaimed),
            Self::WriteClaimed | Self::ReadClaimed => None,
        }
    }

    /// State entered by finishing the work of the claim held in `self`.
    #[inline]
    pub(crate) const fn committed(self) -> Option<Self> {
        match self {
            Self::WriteClaimed => Some(Self::Readable),
            Self::ReadClaimed => Some(Self::Writable),
            Self::Writable | Self::Readable => None,
        }
    }

    /// State entered by giving up the claim held in `self` without effect.
    #[inline]
    pub(crate) const fn restored(self) -> Option<Self> {
        match self {
            Self::WriteClaimed => Some(Self::Writable),
            Self::ReadClaimed => Some(Self::Readable),
            Self::Writable | Self::Readable => None,
        }
    }
}

/// One cell of the ring: tag plus value storage.
///
/// `None` storage means no value and no pooled backing storage. Pooled
/// lifecycles keep it `Some` for the life of the buffer.
pub(crate) struct Slot<T> {
    tag: AtomicU8,
    value: UnsafeCell<Option<T>>,
}

// Safety: the value is only accessed by the thread holding a claim on the
// tag, and claims are exclusive (acquired and released through CAS).
unsafe impl<T: Send> Sync for Slot<T> {}

impl<T> Slot<T> {
    pub(crate) const fn new(value: Option<T>) -> Self {
        Self {
            tag: AtomicU8::new(SlotState::Writable.tag()),
            value: UnsafeCell::new(value),
        }
    }

    /// Current state of the tag.
    #[inline]
    pub(crate) fn state(&self) -> SlotState {
        SlotState::from_tag(self.tag.load(Ordering::Acquire))
    }

    /// Single claim attempt from the resting state `from`.
    ///
    /// May fail spuriously; the returned state then equals `from`.
    #[inline]
    pub(crate) fn try_claim(&self, from: SlotState) -> Result<(), SlotState> {
        let Some(to) = from.claimed() else {
            return Err(self.state());
        };
        self.tag
            .compare_exchange_weak(from.tag(), to.tag(), Ordering::AcqRel, Ordering::Acquire)
            .map(drop)
            .map_err(SlotState::from_tag)
    }

    /// Non-spurious claim attempt from the resting state `from`.
    #[inline]
    pub(crate) fn try_claim_strong(&self, from: SlotState) -> Result<(), SlotState> {
        let Some(to) = from.claimed() else {
            return Err(self.state());
        };
        self.tag
            .compare_exchange(from.tag(), to.tag(), Ordering::AcqRel, Ordering::Acquire)
            .map(drop)
            .map_err(SlotState::from_tag)
    }

    /// Publishes the work done under the claim `held`.
    ///
    /// Fails only if the tag was changed underneath the claim holder.
    #[inline]
    pub(crate) fn commit(&self, held: SlotState) -> Result<(), SlotState> {
        let Some(to) = held.committed() else {
            return Err(self.state());
        };
        self.swap_tag(held, to)
    }

    /// Hands the claim `held` back without publishing anything.
    #[inline]
    pub(crate) fn restore(&self, held: SlotState) -> Result<(), SlotState> {
        let Some(to) = held.restored() else {
            return Err(self.state());
        };
        self.swap_tag(held, to)
    }

    #[inline]
    fn swap_tag(&self, from: SlotState, to: SlotState) -> Result<(), SlotState> {
        self.tag
            .compare_exchange(from.tag(), to.tag(), Ordering::Release, Ordering::Relaxed)
            .map(drop)
            .map_err(SlotState::from_tag)
    }

    /// Forces the tag back to `Writable`, ignoring any claim.
    #[inline]
    pub(crate) fn force_writable(&self) {
        self.tag
            .store(SlotState::Writable.tag(), Ordering::Release);
    }

    /// Raw access to the value storage.
    ///
    /// # Safety
    ///
    /// The caller must hold a claim on this slot (or have exclusive access
    /// to the whole buffer) for as long as the pointer is used.
    #[inline]
    pub(crate) const fn storage(&self) -> *mut Option<T> {
        self.value.get()
    }
}
