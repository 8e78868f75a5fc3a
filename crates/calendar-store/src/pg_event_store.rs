//! `PostgreSQL` implementation of the `EventStorage` trait.

use std::future::Future;

use async_trait::async_trait;
use calendar_core::bucket::{day_end, month_end, month_start, week_end, week_start};
use calendar_core::error::DomainError;
use calendar_core::event::{Event, EventId, EventPatch, check_span};
use calendar_core::storage::{EventStorage, ensure_active};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use sqlx::migrate::MigrateError;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tokio_util::sync::CancellationToken;
use tracing::error;

const INSERT_EVENT: &str = r"
INSERT INTO events (id, title, description, user_id, start_date, end_date, notify_before_secs)
VALUES ($1, $2, $3, $4, $5, $6, $7)
";

const DELETE_EVENT: &str = "DELETE FROM events WHERE id = $1";

const LOCK_SPAN: &str = "SELECT start_date, end_date FROM events WHERE id = $1 FOR UPDATE";

// Span-aware: an event is active on a day if it starts before the day ends
// and its later bound reaches the day's midnight.
const SELECT_BY_DAY: &str = r"
SELECT id, title, description, user_id, start_date, end_date, notify_before_secs
FROM events
WHERE user_id = $1
  AND start_date < $2
  AND GREATEST(start_date, end_date) >= $3
ORDER BY start_date, id
";

const SELECT_BY_START_RANGE: &str = r"
SELECT id, title, description, user_id, start_date, end_date, notify_before_secs
FROM events
WHERE user_id = $1
  AND start_date >= $2
  AND start_date < $3
ORDER BY start_date, id
";

#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    user_id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    notify_before_secs: Option<i64>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from(row.id),
            title: row.title,
            description: row.description,
            user_id: row.user_id,
            start: row.start_date,
            end: row.end_date,
            notify_before: row.notify_before_secs.and_then(TimeDelta::try_seconds),
        }
    }
}

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations. Run once at startup.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if a migration fails to apply.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn select_by_start(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        run(cancel, async {
            let rows: Vec<EventRow> = sqlx::query_as(SELECT_BY_START_RANGE)
                .bind(user_id)
                .bind(midnight(from))
                .bind(midnight(until))
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;
            Ok(rows.into_iter().map(Event::from).collect())
        })
        .await
    }
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn storage_error(err: sqlx::Error) -> DomainError {
    error!(error = %err, "postgres event store operation failed");
    DomainError::StorageUnavailable(err.to_string())
}

/// Runs `operation` unless `cancel` fires first.
async fn run<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    ensure_active(cancel)?;
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DomainError::Cancelled),
        result = operation => result,
    }
}

fn update_statement(id: &EventId, patch: EventPatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE events SET ");
    {
        let mut fields = builder.separated(", ");
        if let Some(title) = patch.title {
            fields.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = patch.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description);
        }
        if let Some(start) = patch.start {
            fields.push("start_date = ").push_bind_unseparated(start);
        }
        if let Some(end) = patch.end {
            fields.push("end_date = ").push_bind_unseparated(end);
        }
        if let Some(notify_before) = patch.notify_before {
            fields
                .push("notify_before_secs = ")
                .push_bind_unseparated(notify_before.map(|lead| lead.num_seconds()));
        }
    }
    builder
        .push(" WHERE id = ")
        .push_bind(id.as_str().to_owned());
    Some(builder)
}

#[async_trait]
impl EventStorage for PgEventStore {
    async fn create(&self, cancel: &CancellationToken, event: Event) -> Result<(), DomainError> {
        run(cancel, async {
            sqlx::query(INSERT_EVENT)
                .bind(event.id.as_str())
                .bind(&event.title)
                .bind(event.description.as_deref())
                .bind(event.user_id)
                .bind(event.start)
                .bind(event.end)
                .bind(event.notify_before.map(|lead| lead.num_seconds()))
                .execute(&self.pool)
                .await
                .map_err(|err| {
                    let duplicate = err
                        .as_database_error()
                        .is_some_and(|db| db.is_unique_violation());
                    if duplicate {
                        DomainError::AlreadyExists(event.id.clone())
                    } else {
                        storage_error(err)
                    }
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        id: &EventId,
        patch: EventPatch,
    ) -> Result<(), DomainError> {
        run(cancel, async move {
            // The row lock keeps the merged span check and the write atomic.
            let mut tx = self.pool.begin().await.map_err(storage_error)?;
            let span: Option<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(LOCK_SPAN)
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;
            let Some((start, end)) = span else {
                return Err(DomainError::NotFound(id.clone()));
            };
            if patch.moves_span() {
                check_span(patch.start.unwrap_or(start), patch.end.unwrap_or(end))?;
            }

            if let Some(mut statement) = update_statement(id, patch) {
                statement
                    .build()
                    .execute(&mut *tx)
                    .await
                    .map_err(storage_error)?;
            }
            tx.commit().await.map_err(storage_error)
        })
        .await
    }

    async fn delete(&self, cancel: &CancellationToken, id: &EventId) -> Result<(), DomainError> {
        run(cancel, async {
            let affected = sqlx::query(DELETE_EVENT)
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(storage_error)?
                .rows_affected();
            if affected == 0 {
                return Err(DomainError::NotFound(id.clone()));
            }
            Ok(())
        })
        .await
    }

    async fn query_by_day(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        ensure_active(cancel)?;
        let until = day_end(day)?;
        run(cancel, async {
            let rows: Vec<EventRow> = sqlx::query_as(SELECT_BY_DAY)
                .bind(user_id)
                .bind(midnight(until))
                .bind(midnight(day))
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;
            Ok(rows.into_iter().map(Event::from).collect())
        })
        .await
    }

    async fn query_by_week(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        ensure_active(cancel)?;
        let week = week_start(date)?;
        self.select_by_start(cancel, user_id, week, week_end(week)?)
            .await
    }

    async fn query_by_month(
        &self,
        cancel: &CancellationToken,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Event>, DomainError> {
        ensure_active(cancel)?;
        let month = month_start(date)?;
        self.select_by_start(cancel, user_id, month, month_end(month)?)
            .await
    }
}
