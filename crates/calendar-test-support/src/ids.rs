//! Test identifier generators: deterministic `IdGenerator` implementations.

use std::sync::atomic::{AtomicUsize, Ordering};

use calendar_core::event::EventId;
use calendar_core::id::IdGenerator;

/// Yields `evt-0001`, `evt-0002`, ... in call order.
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    next: AtomicUsize,
}

impl SequenceIdGenerator {
    /// Create a generator starting at `evt-0001`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> EventId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        EventId::new(format!("evt-{n:04}"))
    }
}

/// Always yields the same identifier. Used to provoke identifier collisions.
#[derive(Debug, Clone)]
pub struct FixedIdGenerator(pub EventId);

impl IdGenerator for FixedIdGenerator {
    fn next_id(&self) -> EventId {
        self.0.clone()
    }
}
