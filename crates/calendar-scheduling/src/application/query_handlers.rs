//! Query handlers for the Scheduling context.
//!
//! This module contains query handlers that read events from storage and
//! return read-only view DTOs.

use calendar_core::error::DomainError;
use calendar_core::event::{Event, EventId};
use calendar_core::storage::EventStorage;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, instrument};

use crate::domain::commands::validate_user;

/// Read-only view of a scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    /// The event identifier.
    pub id: EventId,
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
    /// Notification lead time in seconds.
    pub notify_before_secs: Option<i64>,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            start: event.start,
            end: event.end,
            notify_before_secs: event.notify_before.map(|lead| lead.num_seconds()),
        }
    }
}

fn to_views(result: Result<Vec<Event>, DomainError>) -> Result<Vec<EventView>, DomainError> {
    match result {
        Ok(events) => Ok(events.into_iter().map(EventView::from).collect()),
        Err(err) => {
            error!(error = %err, "failed to load events");
            Err(err)
        }
    }
}

/// Retrieves all events of `user_id` active on `day`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a zero user id and passes storage
/// errors through unchanged.
#[instrument(skip(storage, cancel))]
pub async fn get_events_by_day(
    user_id: i64,
    day: NaiveDate,
    storage: &dyn EventStorage,
    cancel: &CancellationToken,
) -> Result<Vec<EventView>, DomainError> {
    validate_user(user_id)?;
    to_views(storage.query_by_day(cancel, user_id, day).await)
}

/// Retrieves all events of `user_id` starting in the ISO week containing
/// `date`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a zero user id and passes storage
/// errors through unchanged.
#[instrument(skip(storage, cancel))]
pub async fn get_events_by_week(
    user_id: i64,
    date: NaiveDate,
    storage: &dyn EventStorage,
    cancel: &CancellationToken,
) -> Result<Vec<EventView>, DomainError> {
    validate_user(user_id)?;
    to_views(storage.query_by_week(cancel, user_id, date).await)
}

/// Retrieves all events of `user_id` starting in the month containing
/// `date`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a zero user id and passes storage
/// errors through unchanged.
#[instrument(skip(storage, cancel))]
pub async fn get_events_by_month(
    user_id: i64,
    date: NaiveDate,
    storage: &dyn EventStorage,
    cancel: &CancellationToken,
) -> Result<Vec<EventView>, DomainError> {
    validate_user(user_id)?;
    to_views(storage.query_by_month(cancel, user_id, date).await)
}

#[cfg(test)]
mod tests {
    use calendar_core::error::DomainError;
    use calendar_core::event::{Event, EventId};
    use calendar_store::MemoryEventStore;
    use calendar_test_support::{
        EmptyEventStorage, FailingEventStorage, RecordingEventStorage, SequenceIdGenerator,
    };
    use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use crate::application::command_handlers::handle_create_event;
    use crate::application::query_handlers::{
        get_events_by_day, get_events_by_month, get_events_by_week,
    };
    use crate::domain::commands::CreateEvent;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn march(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn create(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateEvent {
        CreateEvent {
            correlation_id: Uuid::new_v4(),
            user_id: 1,
            title: title.to_owned(),
            description: None,
            start,
            end,
            notify_before: None,
        }
    }

    #[tokio::test]
    async fn test_get_events_by_day_maps_to_view() {
        // Arrange
        let event = Event {
            id: EventId::new("evt-1"),
            title: "standup".to_owned(),
            description: Some("daily".to_owned()),
            user_id: 1,
            start: at(4, 9, 0),
            end: at(4, 9, 30),
            notify_before: Some(TimeDelta::minutes(10)),
        };
        let storage = RecordingEventStorage::new(vec![event]);
        let cancel = CancellationToken::new();

        // Act
        let views = get_events_by_day(1, march(4), &storage, &cancel)
            .await
            .unwrap();

        // Assert
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.id, EventId::new("evt-1"));
        assert_eq!(view.description.as_deref(), Some("daily"));
        assert_eq!(view.notify_before_secs, Some(600));
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["id"], "evt-1");
        assert_eq!(json["start"], "2024-03-04T09:00:00Z");
    }

    #[tokio::test]
    async fn test_empty_results_are_not_errors() {
        let cancel = CancellationToken::new();

        let day = get_events_by_day(1, march(4), &EmptyEventStorage, &cancel).await;
        let week = get_events_by_week(1, march(4), &EmptyEventStorage, &cancel).await;
        let month = get_events_by_month(1, march(4), &EmptyEventStorage, &cancel).await;

        assert!(day.unwrap().is_empty());
        assert!(week.unwrap().is_empty());
        assert!(month.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_user_is_rejected() {
        let cancel = CancellationToken::new();

        let result = get_events_by_week(0, march(4), &EmptyEventStorage, &cancel).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_passes_through() {
        let cancel = CancellationToken::new();

        let result = get_events_by_month(1, march(4), &FailingEventStorage, &cancel).await;

        assert!(matches!(result, Err(DomainError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_standup_scenario() {
        // Arrange
        let ids = SequenceIdGenerator::new();
        let storage = MemoryEventStore::new();
        let cancel = CancellationToken::new();

        // Act
        let standup =
            handle_create_event(&create("standup", at(4, 9, 0), at(4, 9, 30)), &ids, &storage, &cancel)
                .await;
        let one_on_one =
            handle_create_event(&create("1:1", at(4, 9, 15), at(4, 9, 45)), &ids, &storage, &cancel)
                .await;
        let lunch =
            handle_create_event(&create("lunch", at(4, 12, 0), at(4, 13, 0)), &ids, &storage, &cancel)
                .await;
        let views = get_events_by_day(1, march(4), &storage, &cancel)
            .await
            .unwrap();

        // Assert
        assert!(standup.is_ok());
        assert!(matches!(one_on_one, Err(DomainError::TimeConflict { .. })));
        assert!(lunch.is_ok());
        let titles: Vec<&str> = views.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["standup", "lunch"]);
    }

    #[tokio::test]
    async fn test_week_and_month_views_group_by_start() {
        // Arrange
        let ids = SequenceIdGenerator::new();
        let storage = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        for (title, start, end) in [
            ("mon", at(4, 9, 0), at(4, 10, 0)),
            ("sun", at(10, 9, 0), at(10, 10, 0)),
            ("next mon", at(11, 9, 0), at(11, 10, 0)),
        ] {
            handle_create_event(&create(title, start, end), &ids, &storage, &cancel)
                .await
                .unwrap();
        }

        // Act
        let week = get_events_by_week(1, march(7), &storage, &cancel)
            .await
            .unwrap();
        let month = get_events_by_month(1, march(31), &storage, &cancel)
            .await
            .unwrap();

        // Assert
        let week_titles: Vec<&str> = week.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(week_titles, vec!["mon", "sun"]);
        assert_eq!(month.len(), 3);
    }
}
