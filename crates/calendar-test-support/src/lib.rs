//! Shared test mocks and utilities for the calendar scheduling service.

mod ids;
mod storage;

pub use ids::{FixedIdGenerator, SequenceIdGenerator};
pub use storage::{EmptyEventStorage, FailingEventStorage, RecordingEventStorage};
