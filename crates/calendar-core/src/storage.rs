//! Event storage abstraction.
//!
//! Both the in-memory store and the PostgreSQL store implement this trait.
//! Implementations must keep identifiers unique, return `NotFound` for
//! updates and deletes of absent events without side effects, and hand out
//! owned copies of stored events.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::error::DomainError;
use crate::event::{Event, EventId, EventPatch};

/// Storage contract for calendar events.
///
/// Every call takes a cancellation token. A token that is already cancelled
/// must produce `DomainError::Cancelled` without touching stored state.
///
/// Query results contain each matching event once, sorted by start instant
/// and then by identifier.
#[async_trait]
pub trait EventStorage: Send + Sync {
    /// Insert a new event.
    async fn create(&self, cancel: &CancellationToken, event: Event) -> Result<(), DomainError>;

    /// Merge `patch` into the stored event with identifier `id`.
    ///
    /// When the patch supplies a start or end, the merged span must pass
    /// [`check_span`](crate::event::check_span); otherwise the call fails with
    /// `DomainError::Validation` and the stored event is left unchanged.
    async fn update(
        &self,
        cancel: &CancellationToken,
        id: &EventId,
        patch: EventPatch,
    ) -> Result<(), DomainError>;

    /// Remove the event with identifier `id`.
    async fn delete(&self, cancel: &CancellationToken, id: &EventId) -> Result<(), DomainError>;

    /// Events of `user_id` active on `day`.
    ///
    /// Dates whose bucket bounds fall outside the representable calendar
    /// fail with `DomainError::Validation`; the same holds for week and
    /// month queries.
    async fn query_by_day(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Event>, DomainError>;

    /// Events of `user_id` starting in the ISO week containing `date`.
    async fn query_by_week(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError>;

    /// Events of `user_id` starting in the month containing `date`.
    async fn query_by_month(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError>;
}

/// Returns `Err(DomainError::Cancelled)` if `cancel` has fired.
///
/// # Errors
///
/// Returns `DomainError::Cancelled` when the token is cancelled.
pub fn ensure_active(cancel: &CancellationToken) -> Result<(), DomainError> {
    if cancel.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}

/// Sorts events by start instant, breaking ties by identifier.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
}
