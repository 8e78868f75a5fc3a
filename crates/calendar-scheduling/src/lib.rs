//! Calendar: Scheduling bounded context.
//!
//! Responsible for assigning event identifiers, rejecting double-bookings at
//! creation time, and translating stored events into their public view.

pub mod application;
pub mod domain;
