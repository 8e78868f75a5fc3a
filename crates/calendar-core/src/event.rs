//! The calendar event entity and its partial-update patch.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest time an event may cover, in days. Bounds the number of day
/// buckets a single event occupies.
pub const MAX_SPAN_DAYS: i64 = 31;

/// Opaque event identifier, assigned by the scheduling layer on creation.
///
/// Identifiers compare lexicographically; query results use this ordering to
/// break ties between events that start at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps an existing identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A scheduled calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Short title; never empty for a created event.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Owning user.
    pub user_id: i64,
    /// Start instant (inclusive).
    pub start: DateTime<Utc>,
    /// End instant (exclusive).
    pub end: DateTime<Utc>,
    /// How long before `start` the owner wants to be notified.
    pub notify_before: Option<TimeDelta>,
}

impl Event {
    /// Returns `true` when the half-open intervals `[start, end)` of both
    /// events intersect. Events that merely touch do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Event) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Checks that `[start, end)` is not inverted and covers at most
/// [`MAX_SPAN_DAYS`].
///
/// # Errors
///
/// Returns `DomainError::Validation` if `end` precedes `start` or the span is
/// too long.
pub fn check_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError> {
    if end < start {
        return Err(DomainError::Validation(
            "end must not precede start".into(),
        ));
    }
    if end - start > TimeDelta::days(MAX_SPAN_DAYS) {
        return Err(DomainError::Validation(format!(
            "event must not span more than {MAX_SPAN_DAYS} days"
        )));
    }
    Ok(())
}

/// Partial update for a stored event.
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    /// New title.
    pub title: Option<String>,
    /// New description, or `Some(None)` to clear it.
    pub description: Option<Option<String>>,
    /// New start instant.
    pub start: Option<DateTime<Utc>>,
    /// New end instant.
    pub end: Option<DateTime<Utc>>,
    /// New notification lead time, or `Some(None)` to clear it.
    pub notify_before: Option<Option<TimeDelta>>,
}

impl EventPatch {
    /// Returns `true` if applying this patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.notify_before.is_none()
    }

    /// Returns `true` if the patch supplies a start or end instant.
    #[must_use]
    pub fn moves_span(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Merges the supplied fields into `event`.
    ///
    /// Returns `true` if the event's start or end instant changed, in which
    /// case any derived bucket membership must be recomputed.
    pub fn apply_to(&self, event: &mut Event) -> bool {
        if let Some(title) = &self.title {
            event.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            event.description.clone_from(description);
        }
        if let Some(notify_before) = self.notify_before {
            event.notify_before = notify_before;
        }

        let mut rescheduled = false;
        if let Some(start) = self.start {
            rescheduled |= event.start != start;
            event.start = start;
        }
        if let Some(end) = self.end {
            rescheduled |= event.end != end;
            event.end = end;
        }
        rescheduled
    }
}
