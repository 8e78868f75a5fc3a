//! Calendar Store: implementations of the `EventStorage` contract.
//!
//! `MemoryEventStore` keeps process-scoped state behind a reader/writer lock
//! with a span-aware day index. `PgEventStore` persists events in
//! PostgreSQL and answers the same queries with range predicates.

pub mod memory_event_store;
pub mod pg_event_store;
pub mod temporal_index;

pub use memory_event_store::MemoryEventStore;
pub use pg_event_store::PgEventStore;
pub use temporal_index::TemporalIndex;
