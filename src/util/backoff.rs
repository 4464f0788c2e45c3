//! Exponential backoff between session attempts

use std::time::Duration;

/// Doubling delay, capped at `max`
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
    /// Consecutive failures since the last reset
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before retrying
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Forget previous failures (called once a session is fully up)
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
