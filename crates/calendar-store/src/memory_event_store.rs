//! In-memory implementation of the `EventStorage` trait.
//!
//! State is process-scoped and discarded on drop. The event table and the
//! temporal index sit behind a single reader/writer lock so that every write
//! updates both in one critical section and readers never observe one
//! without the other.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use calendar_core::bucket::{EventBuckets, month_start, week_start};
use calendar_core::error::DomainError;
use calendar_core::event::{Event, EventId, EventPatch, check_span};
use calendar_core::storage::{EventStorage, ensure_active, sort_chronologically};
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::temporal_index::TemporalIndex;

#[derive(Debug)]
struct StoredEvent {
    event: Event,
    buckets: EventBuckets,
}

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, StoredEvent>,
    index: TemporalIndex,
}

impl Tables {
    fn collect<'a>(&self, user_id: i64, ids: impl Iterator<Item = &'a EventId>) -> Vec<Event> {
        // A multi-day event sits in several day buckets; callers only ever
        // pass one bucket, but dedup keeps the contract independent of that.
        let unique: BTreeSet<&EventId> = ids.collect();
        let mut events: Vec<Event> = unique
            .into_iter()
            .filter_map(|id| self.events.get(id))
            .filter(|stored| stored.event.user_id == user_id)
            .map(|stored| stored.event.clone())
            .collect();
        sort_chronologically(&mut events);
        events
    }
}

/// Thread-safe in-memory event store with a day/week/month index.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    tables: RwLock<Tables>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events currently stored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StorageUnavailable` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.events.len())
    }

    /// Returns `true` if no events are stored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StorageUnavailable` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }

    /// Number of non-empty index buckets across all granularities.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StorageUnavailable` if the lock is poisoned.
    pub fn bucket_count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.index.bucket_count())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|_| DomainError::StorageUnavailable("event table lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|_| DomainError::StorageUnavailable("event table lock poisoned".into()))
    }
}

#[async_trait]
impl EventStorage for MemoryEventStore {
    async fn create(&self, cancel: &CancellationToken, event: Event) -> Result<(), DomainError> {
        ensure_active(cancel)?;
        let mut tables = self.write()?;

        if tables.events.contains_key(&event.id) {
            return Err(DomainError::AlreadyExists(event.id));
        }

        let buckets = EventBuckets::for_span(event.start, event.end)?;
        tables.index.insert(&event.id, &buckets);
        debug!(event_id = %event.id, days = buckets.days.len(), "event indexed");
        tables
            .events
            .insert(event.id.clone(), StoredEvent { event, buckets });
        Ok(())
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        id: &EventId,
        patch: EventPatch,
    ) -> Result<(), DomainError> {
        ensure_active(cancel)?;
        let mut guard = self.write()?;
        let tables = &mut *guard;

        let stored = tables
            .events
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(id.clone()))?;

        // Merge into a copy so a rejected patch leaves the record untouched.
        let mut updated = stored.event.clone();
        let rescheduled = patch.apply_to(&mut updated);
        if patch.moves_span() {
            check_span(updated.start, updated.end)?;
        }
        if rescheduled {
            let buckets = EventBuckets::for_span(updated.start, updated.end)?;
            tables.index.remove(id, &stored.buckets);
            tables.index.insert(id, &buckets);
            debug!(event_id = %id, days = buckets.days.len(), "event re-indexed");
            stored.buckets = buckets;
        }
        stored.event = updated;
        Ok(())
    }

    async fn delete(&self, cancel: &CancellationToken, id: &EventId) -> Result<(), DomainError> {
        ensure_active(cancel)?;
        let mut tables = self.write()?;

        let stored = tables
            .events
            .remove(id)
            .ok_or_else(|| DomainError::NotFound(id.clone()))?;
        tables.index.remove(id, &stored.buckets);
        Ok(())
    }

    async fn query_by_day(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        ensure_active(cancel)?;
        let tables = self.read()?;
        Ok(tables.collect(user_id, tables.index.day(day)))
    }

    async fn query_by_week(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        ensure_active(cancel)?;
        let tables = self.read()?;
        Ok(tables.collect(user_id, tables.index.week(week_start(date)?)))
    }

    async fn query_by_month(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        ensure_active(cancel)?;
        let tables = self.read()?;
        Ok(tables.collect(user_id, tables.index.month(month_start(date)?)))
    }
}

#[cfg(test)]
mod tests {
    use calendar_core::error::DomainError;
    use calendar_core::event::{Event, EventId, EventPatch};
    use calendar_core::storage::EventStorage;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tokio_util::sync::CancellationToken;

    use super::MemoryEventStore;

    fn event(id: &str, user_id: i64, day: u32, start_hour: u32, end_hour: u32) -> Event {
        Event {
            id: EventId::new(id),
            title: format!("event {id}"),
            description: None,
            user_id,
            start: Utc.with_ymd_and_hms(2024, 3, day, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, day, end_hour, 0, 0).unwrap(),
            notify_before: None,
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_identifier() {
        // Arrange
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        store.create(&cancel, event("evt-1", 1, 4, 9, 10)).await.unwrap();

        // Act
        let result = store.create(&cancel, event("evt-1", 1, 5, 9, 10)).await;

        // Assert
        match result.unwrap_err() {
            DomainError::AlreadyExists(id) => assert_eq!(id, EventId::new("evt-1")),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
        let day_four = store.query_by_day(&cancel, 1, march(4)).await.unwrap();
        assert_eq!(day_four.len(), 1);
        assert!(store.query_by_day(&cancel, 1, march(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_moves_event_between_day_buckets() {
        // Arrange
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        store.create(&cancel, event("evt-1", 1, 4, 9, 10)).await.unwrap();
        let patch = EventPatch {
            start: Some(Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()),
            ..EventPatch::default()
        };

        // Act
        store
            .update(&cancel, &EventId::new("evt-1"), patch)
            .await
            .unwrap();

        // Assert
        assert!(store.query_by_day(&cancel, 1, march(4)).await.unwrap().is_empty());
        let moved = store.query_by_day(&cancel, 1, march(6)).await.unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].start.date_naive(), march(6));
        // One day, one week, one month bucket remain.
        assert_eq!(store.bucket_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_rejects_merged_span_ending_before_start() {
        // Arrange
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        let original = event("evt-1", 1, 4, 10, 11);
        store.create(&cancel, original.clone()).await.unwrap();
        let early_end = EventPatch {
            title: Some("renamed".to_owned()),
            end: Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            ..EventPatch::default()
        };
        let late_start = EventPatch {
            start: Some(Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()),
            ..EventPatch::default()
        };

        // Act
        let early = store.update(&cancel, &original.id, early_end).await;
        let late = store.update(&cancel, &original.id, late_start).await;

        // Assert
        assert!(matches!(early, Err(DomainError::Validation(_))));
        assert!(matches!(late, Err(DomainError::Validation(_))));
        let stored = store.query_by_day(&cancel, 1, march(4)).await.unwrap();
        assert_eq!(stored, vec![original]);
        assert_eq!(store.bucket_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_rejects_merged_span_that_is_too_long() {
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        store.create(&cancel, event("evt-1", 1, 4, 10, 11)).await.unwrap();

        let result = store
            .update(
                &cancel,
                &EventId::new("evt-1"),
                EventPatch {
                    end: Some(Utc.with_ymd_and_hms(2124, 3, 4, 11, 0, 0).unwrap()),
                    ..EventPatch::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(store.bucket_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_week_query_at_calendar_edge_is_rejected() {
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();

        let result = store.query_by_week(&cancel, 1, NaiveDate::MIN).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_of_missing_event_returns_not_found() {
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();

        let result = store
            .update(&cancel, &EventId::new("evt-404"), EventPatch::default())
            .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_delete_prunes_index() {
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        store.create(&cancel, event("evt-1", 1, 4, 9, 10)).await.unwrap();

        store.delete(&cancel, &EventId::new("evt-1")).await.unwrap();

        assert!(store.is_empty().unwrap());
        assert_eq!(store.bucket_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_leaves_state_untouched() {
        // Arrange
        let store = MemoryEventStore::new();
        let live = CancellationToken::new();
        store.create(&live, event("evt-1", 1, 4, 9, 10)).await.unwrap();
        let cancelled = CancellationToken::new();
        cancelled.cancel();

        // Act
        let create = store.create(&cancelled, event("evt-2", 1, 4, 11, 12)).await;
        let delete = store.delete(&cancelled, &EventId::new("evt-1")).await;
        let query = store.query_by_day(&cancelled, 1, march(4)).await;

        // Assert
        assert!(matches!(create, Err(DomainError::Cancelled)));
        assert!(matches!(delete, Err(DomainError::Cancelled)));
        assert!(matches!(query, Err(DomainError::Cancelled)));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_returns_copies() {
        let store = MemoryEventStore::new();
        let cancel = CancellationToken::new();
        store.create(&cancel, event("evt-1", 1, 4, 9, 10)).await.unwrap();

        let mut fetched = store.query_by_day(&cancel, 1, march(4)).await.unwrap();
        fetched[0].title = "mutated".to_owned();

        let again = store.query_by_day(&cancel, 1, march(4)).await.unwrap();
        assert_eq!(again[0].title, "event evt-1");
    }
}
