//! Ping-pong latency and 2x2 throughput for `RingBuffer`.
//!
//! Run: cargo bench --bench profile_ring
//! Pin: sudo taskset -c 0,2 ./target/release/deps/profile_ring-*

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use nexus_ring::RingBuffer;

const WARMUP: usize = 100_000;
const SAMPLES: usize = 10_000_000;
const CAPACITY: usize = 1024;
const THROUGHPUT_COUNT: u64 = 10_000_000;
const THREADS: u64 = 2;

#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtscp() -> u64 {
    unsafe {
        let mut aux: u32 = 0;
        core::arch::x86_64::__rdtscp(&mut aux)
    }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn rdtscp() -> u64 {
    use std::sync::OnceLock;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

fn push(rb: &RingBuffer<u64>, mut v: u64) {
    while let Err(e) = rb.enqueue(v) {
        v = e.into_inner().expect("full or not ready returns the value");
        std::hint::spin_loop();
    }
}

fn pop(rb: &RingBuffer<u64>) -> u64 {
    loop {
        if let Ok(v) = rb.dequeue() {
            return v;
        }
        std::hint::spin_loop();
    }
}

fn latency_benchmark() {
    println!("=== Latency Benchmark (ping-pong RTT/2) ===");
    println!("Warmup:   {:>8}", WARMUP);
    println!("Samples:  {:>8}", SAMPLES);
    println!("Capacity: {:>8}", CAPACITY);
    println!();

    let ping = Arc::new(RingBuffer::<u64>::new(CAPACITY));
    let pong = Arc::new(RingBuffer::<u64>::new(CAPACITY));

    let total = WARMUP + SAMPLES;
    let echo = {
        let ping = Arc::clone(&ping);
        let pong = Arc::clone(&pong);
        thread::spawn(move || {
            for _ in 0..total {
                push(&pong, pop(&ping));
            }
        })
    };

    for i in 0..WARMUP as u64 {
        push(&ping, i);
        pop(&pong);
    }

    let mut hist = Histogram::<u64>::new_with_max(1_000_000, 3).unwrap();
    for i in 0..SAMPLES as u64 {
        let start = rdtscp();
        push(&ping, i);
        pop(&pong);
        let latency = rdtscp().wrapping_sub(start) / 2;
        let _ = hist.record(latency.min(1_000_000));
    }

    echo.join().unwrap();

    let cpu_ghz = estimate_cpu_freq_ghz();
    println!("One-way latency (cycles, ~{cpu_ghz:.2} GHz):");
    for (label, q) in [("p50", 0.50), ("p90", 0.90), ("p99", 0.99), ("p999", 0.999), ("p9999", 0.9999)] {
        let cycles = hist.value_at_quantile(q);
        println!("  {label:<6} {cycles:>7}  ({:>7.1} ns)", cycles as f64 / cpu_ghz);
    }
    println!("  max:   {:>7}", hist.max());
    println!();
    println!("put_waits: {}  get_waits: {}", ping.put_waits(), ping.get_waits());
}

fn throughput_benchmark() {
    println!("=== Throughput Benchmark ({THREADS} producers, {THREADS} consumers) ===");
    println!("Messages: {:>10}", THROUGHPUT_COUNT);
    println!();

    let rb = Arc::new(RingBuffer::<u64>::new(CAPACITY));
    let per_thread = THROUGHPUT_COUNT / THREADS;
    let start = Instant::now();

    let producers: Vec<_> = (0..THREADS)
        .map(|_| {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                for i in 0..per_thread {
                    push(&rb, i);
                }
            })
        })
        .collect();
    let consumers: Vec<_> = (0..THREADS)
        .map(|_| {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                let mut sum = 0u64;
                for _ in 0..per_thread {
                    sum = sum.wrapping_add(pop(&rb));
                }
                sum
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    let sum: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();
    let elapsed = start.elapsed();

    assert_eq!(sum, THREADS * per_thread * (per_thread - 1) / 2);

    let msgs_per_sec = THROUGHPUT_COUNT as f64 / elapsed.as_secs_f64();
    println!("  Total time:  {:>10.2?}", elapsed);
    println!("  Throughput:  {:>10.2} M msgs/sec", msgs_per_sec / 1_000_000.0);
    println!("  put_waits:   {:>10}", rb.put_waits());
    println!("  get_waits:   {:>10}", rb.get_waits());
}

fn estimate_cpu_freq_ghz() -> f64 {
    let start_cycles = rdtscp();
    let start_time = Instant::now();
    thread::sleep(Duration::from_millis(10));
    let end_cycles = rdtscp();
    end_cycles.wrapping_sub(start_cycles) as f64 / start_time.elapsed().as_nanos() as f64
}

fn main() {
    println!("nexus-ring RingBuffer Benchmark");
    println!("===============================");
    println!();

    latency_benchmark();
    println!();
    throughput_benchmark();
}
