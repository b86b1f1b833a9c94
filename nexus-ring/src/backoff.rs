//! Contention backoff used while waiting for a slot to change hands.
//!
//! A thread that owns a position but finds the slot still held by its
//! previous occupant waits with an escalating strategy: busy-spin in
//! doubling rounds, then yield the time slice, then sleep for doubling
//! micro-intervals up to a ceiling. The schedule is a pure function of the
//! step number ([`Backoff::step`]) so it can be inspected without timing.

use std::hint;
use std::thread;
use std::time::Duration;

const DEFAULT_SPIN_LIMIT: u32 = 6;
const DEFAULT_YIELD_LIMIT: u32 = 4;
const DEFAULT_MAX_SLEEP: Duration = Duration::from_micros(100);

/// What a single wait round does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Busy-spin for this many `spin_loop` hints.
    Spin(u32),
    /// Yield to the OS scheduler.
    Yield,
    /// Sleep for this long.
    Sleep(Duration),
}

/// Tunable spin/yield/sleep schedule.
///
/// Rounds `0..spin_limit` spin `2^round` times, the next `yield_limit`
/// rounds yield, and every later round sleeps `2^n` microseconds (capped at
/// `max_sleep`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    spin_limit: u32,
    yield_limit: u32,
    max_sleep: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    /// The default schedule: 6 spin rounds, 4 yields, sleeps up to 100µs.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spin_limit: DEFAULT_SPIN_LIMIT,
            yield_limit: DEFAULT_YIELD_LIMIT,
            max_sleep: DEFAULT_MAX_SLEEP,
        }
    }

    /// Sets the number of spin rounds (clamped to 16).
    #[must_use]
    pub const fn spin_limit(mut self, rounds: u32) -> Self {
        self.spin_limit = if rounds > 16 { 16 } else { rounds };
        self
    }

    /// Sets the number of yield rounds after spinning.
    #[must_use]
    pub const fn yield_limit(mut self, rounds: u32) -> Self {
        self.yield_limit = rounds;
        self
    }

    /// Sets the longest single sleep.
    #[must_use]
    pub const fn max_sleep(mut self, max: Duration) -> Self {
        self.max_sleep = max;
        self
    }

    /// The action taken on wait round `round` (0-based).
    #[must_use]
    pub fn step(&self, round: u32) -> Step {
        if round < self.spin_limit {
            return Step::Spin(1 << round);
        }
        let past_spin = round - self.spin_limit;
        if past_spin < self.yield_limit {
            return Step::Yield;
        }
        let exponent = (past_spin - self.yield_limit).min(32);
        let micros = 1u64 << exponent;
        Step::Sleep(Duration::from_micros(micros).min(self.max_sleep))
    }

    /// Starts a fresh wait sequence.
    #[inline]
    pub(crate) const fn start(&self) -> Waiter {
        Waiter {
            policy: *self,
            round: 0,
        }
    }
}

/// One in-progress wait sequence.
pub(crate) struct Waiter {
    policy: Backoff,
    round: u32,
}

impl Waiter {
    /// Performs the current round and escalates.
    #[cold]
    pub(crate) fn snooze(&mut self) {
        match self.policy.step(self.round) {
            Step::Spin(n) => {
                for _ in 0..n {
                    hint::spin_loop();
                }
            }
            Step::Yield => thread::yield_now(),
            Step::Sleep(d) => thread::sleep(d),
        }
        self.round = self.round.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule() {
        let b = Backoff::new();

        assert_eq!(b.step(0), Step::Spin(1));
        assert_eq!(b.step(1), Step::Spin(2));
        assert_eq!(b.step(5), Step::Spin(32));
        assert_eq!(b.step(6), Step::Yield);
        assert_eq!(b.step(9), Step::Yield);
        assert_eq!(b.step(10), Step::Sleep(Duration::from_micros(1)));
        assert_eq!(b.step(11), Step::Sleep(Duration::from_micros(2)));
        assert_eq!(b.step(16), Step::Sleep(Duration::from_micros(64)));
        assert_eq!(b.step(17), Step::Sleep(Duration::from_micros(100)));
    }

    #[test]
    fn sleep_saturates_at_ceiling() {
        let b = Backoff::new();
        assert_eq!(b.step(u32::MAX), Step::Sleep(Duration::from_micros(100)));
    }

    #[test]
    fn tuned_schedule() {
        let b = Backoff::new()
            .spin_limit(0)
            .yield_limit(1)
            .max_sleep(Duration::from_micros(4));

        assert_eq!(b.step(0), Step::Yield);
        assert_eq!(b.step(1), Step::Sleep(Duration::from_micros(1)));
        assert_eq!(b.step(3), Step::Sleep(Duration::from_micros(4)));
        assert_eq!(b.step(40), Step::Sleep(Duration::from_micros(4)));
    }

    #[test]
    fn spin_limit_is_clamped() {
        let b = Backoff::new().spin_limit(100);
        assert_eq!(b.step(15), Step::Spin(1 << 15));
        assert_eq!(b.step(16), Step::Yield);
    }

    #[test]
    fn waiter_escalates() {
        let mut waiter = Backoff::new().spin_limit(1).yield_limit(1).start();
        waiter.snooze();
        waiter.snooze();
        waiter.snooze();
        assert_eq!(waiter.round, 3);
    }
}
