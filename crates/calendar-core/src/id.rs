//! Identifier generation abstraction.
//!
//! In production, identifiers are time-ordered UUIDs. In tests, a
//! deterministic sequence is injected.

use uuid::Uuid;

use crate::event::EventId;

/// Abstraction over event identifier generation.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier, never returned before by this generator.
    fn next_id(&self) -> EventId;
}

/// Production generator backed by UUIDv7.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> EventId {
        EventId::new(Uuid::now_v7().to_string())
    }
}
