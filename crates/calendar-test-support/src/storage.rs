//! Test storages: mock `EventStorage` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use calendar_core::error::DomainError;
use calendar_core::event::{Event, EventId, EventPatch};
use calendar_core::storage::EventStorage;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

/// An event storage that records every mutation and day query. Returns the
/// configured events from each query call (regardless of user or date) and
/// always succeeds on mutations.
#[derive(Debug, Default)]
pub struct RecordingEventStorage {
    query_result: Vec<Event>,
    created: Mutex<Vec<Event>>,
    updated: Mutex<Vec<(EventId, EventPatch)>>,
    deleted: Mutex<Vec<EventId>>,
    day_queries: Mutex<Vec<(i64, NaiveDate)>>,
}

impl RecordingEventStorage {
    /// Create a new recording storage that will return `query_result` from
    /// every query call.
    #[must_use]
    pub fn new(query_result: Vec<Event>) -> Self {
        Self {
            query_result,
            ..Self::default()
        }
    }

    /// Returns a snapshot of all events passed to `create`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn created_events(&self) -> Vec<Event> {
        self.created.lock().unwrap().clone()
    }

    /// Returns a snapshot of all `update` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn updates(&self) -> Vec<(EventId, EventPatch)> {
        self.updated.lock().unwrap().clone()
    }

    /// Returns a snapshot of all deleted identifiers.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn deleted_ids(&self) -> Vec<EventId> {
        self.deleted.lock().unwrap().clone()
    }

    /// Returns a snapshot of all `(user_id, day)` pairs queried by day.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn day_queries(&self) -> Vec<(i64, NaiveDate)> {
        self.day_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStorage for RecordingEventStorage {
    async fn create(&self, _cancel: &CancellationToken, event: Event) -> Result<(), DomainError> {
        self.created.lock().unwrap().push(event);
        Ok(())
    }

    async fn update(
        &self,
        _cancel: &CancellationToken,
        id: &EventId,
        patch: EventPatch,
    ) -> Result<(), DomainError> {
        self.updated.lock().unwrap().push((id.clone(), patch));
        Ok(())
    }

    async fn delete(&self, _cancel: &CancellationToken, id: &EventId) -> Result<(), DomainError> {
        self.deleted.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn query_by_day(
        &self,
        _cancel: &CancellationToken,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        self.day_queries.lock().unwrap().push((user_id, day));
        Ok(self.query_result.clone())
    }

    async fn query_by_week(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(self.query_result.clone())
    }

    async fn query_by_month(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(self.query_result.clone())
    }
}

/// An event storage that holds nothing: queries return empty lists, creates
/// succeed, and updates and deletes report `NotFound`.
#[derive(Debug)]
pub struct EmptyEventStorage;

#[async_trait]
impl EventStorage for EmptyEventStorage {
    async fn create(&self, _cancel: &CancellationToken, _event: Event) -> Result<(), DomainError> {
        Ok(())
    }

    async fn update(
        &self,
        _cancel: &CancellationToken,
        id: &EventId,
        _patch: EventPatch,
    ) -> Result<(), DomainError> {
        Err(DomainError::NotFound(id.clone()))
    }

    async fn delete(&self, _cancel: &CancellationToken, id: &EventId) -> Result<(), DomainError> {
        Err(DomainError::NotFound(id.clone()))
    }

    async fn query_by_day(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _day: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(vec![])
    }

    async fn query_by_week(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(vec![])
    }

    async fn query_by_month(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Ok(vec![])
    }
}

/// An event storage that always returns a storage error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingEventStorage;

fn unavailable() -> DomainError {
    DomainError::StorageUnavailable("connection refused".into())
}

#[async_trait]
impl EventStorage for FailingEventStorage {
    async fn create(&self, _cancel: &CancellationToken, _event: Event) -> Result<(), DomainError> {
        Err(unavailable())
    }

    async fn update(
        &self,
        _cancel: &CancellationToken,
        _id: &EventId,
        _patch: EventPatch,
    ) -> Result<(), DomainError> {
        Err(unavailable())
    }

    async fn delete(&self, _cancel: &CancellationToken, _id: &EventId) -> Result<(), DomainError> {
        Err(unavailable())
    }

    async fn query_by_day(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _day: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Err(unavailable())
    }

    async fn query_by_week(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Err(unavailable())
    }

    async fn query_by_month(
        &self,
        _cancel: &CancellationToken,
        _user_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        Err(unavailable())
    }
}
