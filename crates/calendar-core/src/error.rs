//! Domain error types.

use thiserror::Error;

use crate::event::EventId;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The targeted event does not exist.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// An event with this identifier is already stored. Signals an identifier
    /// generation bug upstream.
    #[error("event already exists: {0}")]
    AlreadyExists(EventId),

    /// The new event overlaps an existing event owned by the same user.
    #[error("time slot is already taken by event {conflicting_id}")]
    TimeConflict {
        /// The existing event that overlaps.
        conflicting_id: EventId,
    },

    /// The caller cancelled the operation before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// The backing store could not complete the operation.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),
}
