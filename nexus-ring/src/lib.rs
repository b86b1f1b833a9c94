//! # nexus-ring
//!
//! Bounded lock-free multi-producer multi-consumer ring buffers.
//!
//! ## Features
//!
//! - **[`RingBuffer`]**: rejects new values with [`PushError::Full`] when full
//! - **[`OverwritingRingBuffer`]**: evicts the oldest value when full and
//!   reports how many it evicted
//! - **[`lifecycle`]**: optional per-slot storage pooling, so heavy values
//!   reuse their slot's allocation instead of reallocating every lap
//!
//! ## Design
//!
//! - Two cache-padded 64-bit cursors (`head`, `tail`) hand out positions
//! - Each slot carries a 4-state handshake tag: a value is only visible once
//!   its writer commits, and only one thread owns a slot at a time
//! - Capacity rounds up to a power of two; one slot stays reserved so full
//!   and empty are distinct
//! - Contention is absorbed by a [`Backoff`] schedule (spin, yield, sleep)
//! - Wait counters and opt-in `tracing` events for diagnosis
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use nexus_ring::RingBuffer;
//!
//! let rb = Arc::new(RingBuffer::<u64>::new(1024));
//!
//! let producers: Vec<_> = (0..4)
//!     .map(|p| {
//!         let rb = Arc::clone(&rb);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 let mut v = p * 1000 + i;
//!                 while let Err(e) = rb.enqueue(v) {
//!                     v = e.into_inner().unwrap();
//!                     std::hint::spin_loop();
//!                 }
//!             }
//!         })
//!     })
//!     .collect();
//! for h in producers {
//!     h.join().unwrap();
//! }
//!
//! let mut count = 0;
//! while rb.dequeue().is_ok() {
//!     count += 1;
//! }
//! assert_eq!(count, 400);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod backoff;
mod config;
mod cursor;
mod diagnostics;
mod error;
pub mod lifecycle;
mod overwriting;
mod ring;
mod slot;

pub use backoff::{Backoff, Step};
pub use config::Builder;
pub use error::{PopError, PushError};
pub use overwriting::{Enqueued, OverwritingRingBuffer};
pub use ring::RingBuffer;
