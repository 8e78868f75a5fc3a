//! Command handlers for the Scheduling context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: validate, check business rules, delegate
//! persistence to the configured storage.
//!
//! The conflict check in `handle_create_event` reads and then writes through
//! two separate storage calls. Two concurrent creates for the same user can
//! both pass the check before either is stored.

use calendar_core::bucket::EventBuckets;
use calendar_core::command::Command;
use calendar_core::error::DomainError;
use calendar_core::event::{Event, EventId};
use calendar_core::id::IdGenerator;
use calendar_core::storage::{EventStorage, ensure_active, sort_chronologically};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::domain::commands::{CreateEvent, DeleteEvent, UpdateEvent};
use crate::domain::conflict::find_conflict;

/// Loads every event of the candidate's owner active on any day the
/// candidate spans, deduplicated and in chronological order.
async fn same_day_events(
    candidate: &Event,
    cancel: &CancellationToken,
    storage: &dyn EventStorage,
) -> Result<Vec<Event>, DomainError> {
    let mut existing = Vec::new();
    for day in EventBuckets::for_span(candidate.start, candidate.end)?.days {
        existing.extend(storage.query_by_day(cancel, candidate.user_id, day).await?);
    }
    sort_chronologically(&mut existing);
    existing.dedup_by(|a, b| a.id == b.id);
    Ok(existing)
}

/// Handles the `CreateEvent` command: validates it, assigns a fresh
/// identifier, rejects overlaps with the owner's existing events, and
/// stores the event.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid fields,
/// `DomainError::TimeConflict` if the owner already has an overlapping
/// event, and passes storage errors through unchanged.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        user_id = command.user_id,
    )
)]
pub async fn handle_create_event(
    command: &CreateEvent,
    ids: &dyn IdGenerator,
    storage: &dyn EventStorage,
    cancel: &CancellationToken,
) -> Result<EventId, DomainError> {
    command.validate()?;
    ensure_active(cancel)?;

    let event = Event {
        id: ids.next_id(),
        title: command.title.clone(),
        description: command.description.clone(),
        user_id: command.user_id,
        start: command.start,
        end: command.end,
        notify_before: command.notify_before,
    };

    let existing = same_day_events(&event, cancel, storage).await?;
    if let Some(conflict) = find_conflict(&event, &existing) {
        warn!(
            event_id = %conflict.id,
            start = %conflict.start,
            end = %conflict.end,
            "requested time is already taken"
        );
        return Err(DomainError::TimeConflict {
            conflicting_id: conflict.id.clone(),
        });
    }

    let id = event.id.clone();
    if let Err(err) = storage.create(cancel, event).await {
        error!(event_id = %id, error = %err, "failed to store event");
        return Err(err);
    }

    info!(event_id = %id, "event created");
    Ok(id)
}

/// Handles the `UpdateEvent` command by delegating the patch to storage.
///
/// The update is not re-checked against the owner's other events, so a
/// reschedule can introduce an overlap.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid fields,
/// `DomainError::NotFound` if the event does not exist, and passes other
/// storage errors through unchanged.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
    )
)]
pub async fn handle_update_event(
    command: &UpdateEvent,
    storage: &dyn EventStorage,
    cancel: &CancellationToken,
) -> Result<(), DomainError> {
    command.validate()?;

    if let Err(err) = storage
        .update(cancel, &command.event_id, command.patch.clone())
        .await
    {
        error!(error = %err, "failed to update event");
        return Err(err);
    }

    info!("event updated");
    Ok(())
}

/// Handles the `DeleteEvent` command by delegating to storage.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the event does not exist, and passes
/// other storage errors through unchanged.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
    )
)]
pub async fn handle_delete_event(
    command: &DeleteEvent,
    storage: &dyn EventStorage,
    cancel: &CancellationToken,
) -> Result<(), DomainError> {
    if let Err(err) = storage.delete(cancel, &command.event_id).await {
        error!(error = %err, "failed to delete event");
        return Err(err);
    }

    info!("event deleted");
    Ok(())
}
