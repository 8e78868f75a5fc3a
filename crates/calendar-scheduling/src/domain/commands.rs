//! Commands for the Scheduling context.

use calendar_core::command::Command;
use calendar_core::error::DomainError;
use calendar_core::event::{EventId, EventPatch, check_span};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Command to schedule a new event.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The owning user.
    pub user_id: i64,
    /// Event title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant.
    pub end: DateTime<Utc>,
    /// Optional notification lead time.
    pub notify_before: Option<TimeDelta>,
}

impl CreateEvent {
    /// Checks the command's fields before any storage access.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty title, a zero user id,
    /// an end before the start, a span longer than
    /// [`MAX_SPAN_DAYS`](calendar_core::event::MAX_SPAN_DAYS), or a
    /// negative notification lead time.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_user(self.user_id)?;
        validate_title(&self.title)?;
        check_span(self.start, self.end)?;
        validate_lead_time(self.notify_before)
    }
}

impl Command for CreateEvent {
    fn command_type(&self) -> &'static str {
        "scheduling.create_event"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to partially update an existing event.
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event to update.
    pub event_id: EventId,
    /// Fields to overwrite.
    pub patch: EventPatch,
}

impl UpdateEvent {
    /// Checks the supplied fields before any storage access. A lone start or
    /// end can only be checked against the stored event, which the store does
    /// when it merges the patch.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty title, a bad span when
    /// both start and end are supplied, or a negative lead time.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(title) = &self.patch.title {
            validate_title(title)?;
        }
        if let (Some(start), Some(end)) = (self.patch.start, self.patch.end) {
            check_span(start, end)?;
        }
        validate_lead_time(self.patch.notify_before.flatten())
    }
}

impl Command for UpdateEvent {
    fn command_type(&self) -> &'static str {
        "scheduling.update_event"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove an event.
#[derive(Debug, Clone)]
pub struct DeleteEvent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event to delete.
    pub event_id: EventId,
}

impl Command for DeleteEvent {
    fn command_type(&self) -> &'static str {
        "scheduling.delete_event"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Rejects the zero user id, which marks an unset owner.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `user_id` is zero.
pub fn validate_user(user_id: i64) -> Result<(), DomainError> {
    if user_id == 0 {
        return Err(DomainError::Validation("user_id must be non-zero".into()));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("title must not be empty".into()));
    }
    Ok(())
}

fn validate_lead_time(notify_before: Option<TimeDelta>) -> Result<(), DomainError> {
    if notify_before.is_some_and(|lead| lead < TimeDelta::zero()) {
        return Err(DomainError::Validation(
            "notification lead time must not be negative".into(),
        ));
    }
    Ok(())
}
