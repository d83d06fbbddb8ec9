//! Time sources.
//!
//! [`Clock`] stamps session records with wall-clock time. [`Ticker`] turns a
//! monotonic clock into whole-second batches for `TimerEngine::tick`, so a
//! caller that wakes up late still delivers every elapsed second exactly once.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Wall-clock source for session timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Converts monotonic elapsed time into whole seconds.
///
/// The sub-second remainder carries over to the next poll.
#[derive(Debug, Clone)]
pub struct Ticker {
    last: Instant,
    carry: Duration,
}

impl Ticker {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(at: Instant) -> Self {
        Self {
            last: at,
            carry: Duration::ZERO,
        }
    }

    /// Whole seconds elapsed since the previous poll.
    pub fn poll(&mut self) -> u64 {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.last) + self.carry;
        self.last = now;
        let secs = elapsed.as_secs();
        self.carry = elapsed - Duration::from_secs(secs);
        secs
    }

    /// Drop any accumulated time, e.g. after the timer was paused.
    pub fn rearm(&mut self) {
        self.rearm_at(Instant::now());
    }

    pub fn rearm_at(&mut self, now: Instant) {
        self.last = now;
        self.carry = Duration::ZERO;
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}
