//! Eviction accounting for `OverwritingRingBuffer` under contention.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use nexus_ring::{Enqueued, OverwritingRingBuffer};

#[test]
fn every_value_is_delivered_evicted_or_left() {
    const PRODUCERS: u64 = 4;
    const PER_PRODUCER: u64 = 25_000;

    let rb = Arc::new(OverwritingRingBuffer::<u64>::new(16));
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(PRODUCERS as usize + 1));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let rb = Arc::clone(&rb);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut evicted = 0;
                for i in 0..PER_PRODUCER {
                    evicted += rb.enqueue_overwriting(p * PER_PRODUCER + i).unwrap();
                }
                evicted
            })
        })
        .collect();

    let consumer = {
        let rb = Arc::clone(&rb);
        let done = Arc::clone(&done);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let mut seen = Vec::new();
            while !done.load(Ordering::Acquire) {
                if let Ok(v) = rb.dequeue() {
                    seen.push(v);
                }
            }
            seen
        })
    };

    let evicted: usize = producers.into_iter().map(|h| h.join().unwrap()).sum();
    done.store(true, Ordering::Release);
    let delivered = consumer.join().unwrap();

    let mut remaining = Vec::new();
    while let Ok(v) = rb.dequeue() {
        remaining.push(v);
    }

    let unique: HashSet<_> = delivered.iter().chain(&remaining).collect();
    assert_eq!(unique.len(), delivered.len() + remaining.len(), "duplicate delivery");
    assert!(remaining.len() <= rb.cap_real());
    assert_eq!(
        delivered.len() + remaining.len() + evicted,
        (PRODUCERS * PER_PRODUCER) as usize
    );
}

#[test]
fn latest_window_survives_single_producer() {
    let rb = OverwritingRingBuffer::<u64>::new(8);

    let mut evicted = 0;
    for i in 0..1_000 {
        let Enqueued { evicted: e, size } = rb.enqueue_overwriting_rich(i).unwrap();
        evicted += e;
        assert!(size <= rb.cap_real());
    }
    assert_eq!(evicted, 1_000 - rb.cap_real());

    let window: Vec<_> = std::iter::from_fn(|| rb.dequeue().ok()).collect();
    assert_eq!(window, (993..1_000).collect::<Vec<_>>());
}

#[test]
fn producers_and_evictions_share_one_buffer() {
    let rb = Arc::new(OverwritingRingBuffer::<u64>::new(4));

    let handles: Vec<_> = (0..4)
        .map(|p| {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                for i in 0..10_000 {
                    rb.put(p * 10_000 + i).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(rb.size(), rb.cap_real());
    assert!(rb.is_full());
}
