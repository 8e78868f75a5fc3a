//! Double-booking detection.

use calendar_core::event::Event;

/// Returns the first of `existing` (in the order given) owned by the same
/// user as `candidate` whose interval overlaps it.
#[must_use]
pub fn find_conflict<'a>(candidate: &Event, existing: &'a [Event]) -> Option<&'a Event> {
    existing
        .iter()
        .filter(|other| other.user_id == candidate.user_id && other.id != candidate.id)
        .find(|other| candidate.overlaps(other))
}
