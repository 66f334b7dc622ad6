//! Deferred callbacks for coalescing bursts of layout events.

use std::time::{Duration, Instant};

/// A single pending deadline. Scheduling again replaces the pending one, so
/// a burst of triggers fires once, `delay` after the last of them.
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    due: Option<Instant>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.due = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending deadline, zero if already overdue.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }
}
