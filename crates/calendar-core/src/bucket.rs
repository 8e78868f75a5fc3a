//! Day, week and month bucket arithmetic.
//!
//! All buckets are computed in UTC. A day bucket is the calendar date itself;
//! a week bucket is keyed by the Monday that opens its ISO-8601 week; a month
//! bucket is keyed by the first day of the month.
//!
//! Bucket keys and range ends that would fall outside the representable
//! calendar produce `DomainError::Validation`.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

use crate::error::DomainError;

fn out_of_range(date: NaiveDate) -> DomainError {
    DomainError::Validation(format!("date {date} is outside the supported calendar range"))
}

/// Returns the UTC calendar day containing `instant`.
#[must_use]
pub fn day_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Returns the Monday opening the ISO week that contains `date`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if that Monday precedes the earliest
/// representable date.
pub fn week_start(date: NaiveDate) -> Result<NaiveDate, DomainError> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .ok_or_else(|| out_of_range(date))
}

/// Returns the first day of the month that contains `date`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the date cannot be moved to the first
/// of its month.
pub fn month_start(date: NaiveDate) -> Result<NaiveDate, DomainError> {
    date.with_day(1).ok_or_else(|| out_of_range(date))
}

/// Exclusive end of the day bucket `day`.
///
/// # Errors
///
/// Returns `DomainError::Validation` past the last representable date.
pub fn day_end(day: NaiveDate) -> Result<NaiveDate, DomainError> {
    day.checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_range(day))
}

/// Exclusive end of the week bucket opened by `week`.
///
/// # Errors
///
/// Returns `DomainError::Validation` past the last representable date.
pub fn week_end(week: NaiveDate) -> Result<NaiveDate, DomainError> {
    week.checked_add_days(Days::new(7))
        .ok_or_else(|| out_of_range(week))
}

/// Exclusive end of the month bucket opened by `month`.
///
/// # Errors
///
/// Returns `DomainError::Validation` past the last representable date.
pub fn month_end(month: NaiveDate) -> Result<NaiveDate, DomainError> {
    month
        .checked_add_months(Months::new(1))
        .ok_or_else(|| out_of_range(month))
}

/// Bucket membership derived from an event's start and end instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuckets {
    /// Every day from the start day through the end day, inclusive.
    pub days: Vec<NaiveDate>,
    /// Week bucket of the start day.
    pub week: NaiveDate,
    /// Month bucket of the start day.
    pub month: NaiveDate,
}

impl EventBuckets {
    /// Computes the buckets for an event spanning `[start, end)`.
    ///
    /// Day buckets cover the whole span. Week and month buckets only follow
    /// the start day. An end preceding the start yields the start day alone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the start day's week or month
    /// bucket is not representable.
    pub fn for_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        let first = day_of(start);
        let last = day_of(end).max(first);
        let days = first.iter_days().take_while(|day| *day <= last).collect();

        Ok(Self {
            days,
            week: week_start(first)?,
            month: month_start(first)?,
        })
    }
}
