//! Cooperative poll timer.
//!
//! The scheduler owns no thread. It records when the next tick is due and the
//! observer asks it on every `poll`. Like a re-armed one-shot timer, the next
//! deadline is measured from the moment a tick fires, so a slow tick pushes
//! the following one back instead of causing a burst.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Scheduler {
    period: Duration,
    next_due: Option<Instant>,
    ticks: u64,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            ticks: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Number of ticks fired since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Arm the timer. A running scheduler keeps its current deadline.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.period);
            log::debug!(target: "observer.scheduler", "started with period {:?}", self.period);
        }
    }

    pub fn stop(&mut self) {
        if self.next_due.take().is_some() {
            log::debug!(target: "observer.scheduler", "stopped after {} ticks", self.ticks);
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Record a tick at `now` and re-arm for one period later.
    pub fn fire(&mut self, now: Instant) {
        if self.next_due.is_none() {
            return;
        }
        self.ticks = self.ticks.saturating_add(1);
        self.next_due = Some(now + self.period);
    }
}
