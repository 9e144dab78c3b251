//! Debounce primitive.
//!
//! A `Coalescer` holds at most one pending deadline. Every trigger replaces
//! it with `now + window`, so a burst of triggers fires once, one window
//! after the last trigger in the burst.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Coalescer {
    window: Duration,
    deadline: Option<Instant>,
    triggers: u64,
    fired: u64,
}

impl Coalescer {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            triggers: 0,
            fired: 0,
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Schedules (or reschedules) the pending pass.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
        self.triggers += 1;
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before the pending pass is due; `None` when idle.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Returns true exactly once per burst, when its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.fired += 1;
                true
            }
            _ => false,
        }
    }

    /// Drops the pending pass, if any. Used when a pass runs early.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Triggers received so far.
    #[must_use]
    pub const fn triggers(&self) -> u64 {
        self.triggers
    }

    /// Passes fired so far.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }
}
