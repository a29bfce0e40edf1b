//! Burst coalescing for change notifications.
//!
//! # Architecture
//!
//! The pool feed can emit several notifications per confirmed
//! transaction. Without coalescing, every one of them would start a
//! reconciliation cycle and the later cycles would race the earlier
//! ones for freshness. The `Debouncer` collapses a burst to its final
//! event: each recorded event (re)arms a quiet-period deadline, and the
//! coalesced event is released only once the deadline passes with
//! nothing newer behind it.
//!
//! The type is a plain synchronous state machine driven by whoever owns
//! the worker loop (`poll` once per tick). That keeps it a long-lived
//! component reading current state at invocation time rather than a
//! timer callback closed over dependencies captured at construction,
//! and it makes the timing behavior directly testable.

use std::time::{Duration, Instant};

/// Coalesces a burst of events into the single most recent one
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    latest: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: None,
            deadline: None,
        }
    }

    /// Record an event and restart the quiet period
    ///
    /// Only the most recent event survives a burst; earlier ones are
    /// replaced, never reordered.
    pub fn record(&mut self, event: T) {
        self.latest = Some(event);
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Release the coalesced event if the quiet period has elapsed
    pub fn poll(&mut self) -> Option<T> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                self.latest.take()
            }
            _ => None,
        }
    }

    /// Release the pending event immediately, cancelling the timer
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.latest.take()
    }

    /// Whether an event is waiting out its quiet period
    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }
}
