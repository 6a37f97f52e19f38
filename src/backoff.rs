//! Backoff policy for the restart loop.
//!
//! Unlike a general-purpose retry backoff (which is usually queried by attempt
//! ordinal), the restart loop already tracks its own current wait across
//! iterations, so this type exposes a single-step transition: `initial()` for
//! the very first wait, `next(current)` for every wait after that.

use std::time::Duration;

/// `next(current) = min(current * multiplier, max)`. Never returns zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
}

impl Backoff {
    /// Construct a backoff policy. Callers normally get one of these out of a
    /// validated [`crate::RestartConfig`] rather than building it directly.
    pub(crate) fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self { initial, max, multiplier }
    }

    /// The wait before the first restart attempt.
    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// The wait before the next attempt, given the current wait.
    pub fn next(&self, current: Duration) -> Duration {
        let scaled_nanos = (current.as_nanos() as f64) * self.multiplier;
        // Duration can't hold a negative or NaN value; multiplier is validated >= 1.0
        // at config build time, so scaled_nanos only grows.
        let scaled = if scaled_nanos.is_finite() && scaled_nanos <= u64::MAX as f64 {
            Duration::from_nanos(scaled_nanos as u64)
        } else {
            self.max
        };
        scaled.min(self.max).max(Duration::from_nanos(1))
    }

    /// The wait sequence across `attempts` restart attempts, for tests.
    pub fn sequence(&self, attempts: usize) -> Vec<Duration> {
        let mut waits = Vec::with_capacity(attempts);
        let mut wait = self.initial();
        for i in 0..attempts {
            if i > 0 {
                wait = self.next(wait);
            }
            waits.push(wait);
        }
        waits
    }
}
