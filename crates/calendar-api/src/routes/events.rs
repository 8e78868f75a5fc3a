//! Routes for the Scheduling bounded context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use calendar_core::error::DomainError;
use calendar_core::event::{EventId, EventPatch};
use calendar_scheduling::application::command_handlers;
use calendar_scheduling::application::query_handlers::{self, EventView};
use calendar_scheduling::domain::commands;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// The owning user.
    pub user_id: i64,
    /// Event title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Start instant (RFC 3339).
    pub start: DateTime<Utc>,
    /// End instant (RFC 3339).
    pub end: DateTime<Utc>,
    /// Notification lead time in seconds.
    #[serde(default)]
    pub notify_before_secs: Option<i64>,
}

/// Request body for PATCH /{id}. Absent fields are left unchanged; an
/// explicit `null` clears `description` or `notify_before_secs`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description, or `null` to clear.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// New start instant.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// New end instant.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    /// New lead time in seconds, or `null` to clear.
    #[serde(default, deserialize_with = "present")]
    pub notify_before_secs: Option<Option<i64>>,
}

/// Query string for the day/week/month listings.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// The owning user.
    pub user_id: i64,
    /// Any date inside the requested day, week or month.
    pub date: NaiveDate,
}

/// Response body identifying the affected event.
#[derive(Debug, Serialize)]
pub struct EventIdResponse {
    /// The event identifier.
    pub id: EventId,
}

/// Distinguishes a field sent as `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn lead_time(secs: Option<i64>) -> Result<Option<TimeDelta>, DomainError> {
    secs.map(|secs| {
        TimeDelta::try_seconds(secs).ok_or_else(|| {
            DomainError::Validation("notify_before_secs is out of range".into())
        })
    })
    .transpose()
}

/// POST /
#[instrument(skip(state, request), fields(user_id = request.user_id))]
async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventIdResponse>), ApiError> {
    let command = commands::CreateEvent {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
        title: request.title,
        description: request.description,
        start: request.start,
        end: request.end,
        notify_before: lead_time(request.notify_before_secs)?,
    };

    info!(correlation_id = %command.correlation_id, "handling create_event command");

    let id = command_handlers::handle_create_event(
        &command,
        state.id_generator.as_ref(),
        state.event_storage.as_ref(),
        &state.request_token(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(EventIdResponse { id })))
}

/// PATCH /{id}
#[instrument(skip(state, request))]
async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventIdResponse>, ApiError> {
    let notify_before = match request.notify_before_secs {
        Some(secs) => Some(lead_time(secs)?),
        None => None,
    };
    let command = commands::UpdateEvent {
        correlation_id: Uuid::new_v4(),
        event_id: EventId::from(event_id),
        patch: EventPatch {
            title: request.title,
            description: request.description,
            start: request.start,
            end: request.end,
            notify_before,
        },
    };

    info!(correlation_id = %command.correlation_id, "handling update_event command");

    command_handlers::handle_update_event(
        &command,
        state.event_storage.as_ref(),
        &state.request_token(),
    )
    .await?;

    Ok(Json(EventIdResponse {
        id: command.event_id,
    }))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteEvent {
        correlation_id: Uuid::new_v4(),
        event_id: EventId::from(event_id),
    };

    info!(correlation_id = %command.correlation_id, "handling delete_event command");

    command_handlers::handle_delete_event(
        &command,
        state.event_storage.as_ref(),
        &state.request_token(),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /day
#[instrument(skip(state))]
async fn events_by_day(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let views = query_handlers::get_events_by_day(
        query.user_id,
        query.date,
        state.event_storage.as_ref(),
        &state.request_token(),
    )
    .await?;
    Ok(Json(views))
}

/// GET /week
#[instrument(skip(state))]
async fn events_by_week(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let views = query_handlers::get_events_by_week(
        query.user_id,
        query.date,
        state.event_storage.as_ref(),
        &state.request_token(),
    )
    .await?;
    Ok(Json(views))
}

/// GET /month
#[instrument(skip(state))]
async fn events_by_month(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let views = query_handlers::get_events_by_month(
        query.user_id,
        query.date,
        state.event_storage.as_ref(),
        &state.request_token(),
    )
    .await?;
    Ok(Json(views))
}

/// Returns the router for the scheduling context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event))
        .route("/{id}", patch(update_event).delete(delete_event))
        .route("/day", get(events_by_day))
        .route("/week", get(events_by_week))
        .route("/month", get(events_by_month))
}
