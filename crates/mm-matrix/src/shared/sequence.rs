//! Request sequencing
//!
//! Each axis numbers its fetches. A response is applied only if it answers the
//! most recently issued request, so a slow, superseded search can never
//! overwrite a newer result.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn number(&self) -> u64 {
        self.0
    }
}

/// Monotonic per-axis request counter
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True if no request has been issued after `ticket`.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
