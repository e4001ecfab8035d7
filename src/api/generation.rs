use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies the request that was current when it was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic generation counter. A response is applied only when its ticket
/// still matches the latest generation.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a request that supersedes every earlier one
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Make every outstanding ticket stale
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_supersedes_older() {
        let counter = GenerationCounter::new();
        let first = counter.begin();
        let second = counter.begin();

        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
    }

    #[test]
    fn test_invalidate_makes_outstanding_ticket_stale() {
        let counter = GenerationCounter::new();
        let ticket = counter.begin();
        assert!(counter.is_current(ticket));

        counter.invalidate();
        assert!(!counter.is_current(ticket));

        let next = counter.begin();
        assert!(counter.is_current(next));
    }
}
