//! Request sequencing for resources refreshed from more than one place.
//!
//! Each fetch takes a `Ticket` before it is issued. When it completes, its
//! result is applied only if no later-issued fetch has already been applied,
//! so a slow response can never overwrite a fresher one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues monotonically increasing tickets. Clones share the counter, so
/// background tasks can issue tickets for the same resource.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    next: Arc<AtomicU64>,
}

impl Sequencer {
    pub fn issue(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// A value plus the ticket of the fetch that produced it.
#[derive(Debug, Clone, Default)]
pub struct Sequenced<T> {
    value: T,
    applied: Option<Ticket>,
}

impl<T> Sequenced<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            applied: None,
        }
    }

    /// Whether a result for `ticket` would still be applied
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.applied.map_or(true, |applied| ticket > applied)
    }

    /// Replace the value if `ticket` is newer than the last applied one.
    /// Returns whether the value was replaced.
    pub fn apply(&mut self, ticket: Ticket, value: T) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.value = value;
        self.applied = Some(ticket);
        true
    }

    /// Record that `ticket` completed without a value (a failed fetch) so
    /// older in-flight results are still discarded. Returns whether the
    /// ticket was current.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.applied = Some(ticket);
        true
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}
