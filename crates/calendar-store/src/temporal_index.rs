//! Day/week/month index over event identifiers.
//!
//! The index is derived data: it is rebuilt from the event table's start and
//! end instants and never consulted as the source of truth for event fields.

use std::collections::{BTreeSet, HashMap};

use calendar_core::bucket::EventBuckets;
use calendar_core::event::EventId;
use chrono::NaiveDate;

type Buckets = HashMap<NaiveDate, BTreeSet<EventId>>;

/// Maps bucket keys to the identifiers registered under them.
#[derive(Debug, Default)]
pub struct TemporalIndex {
    days: Buckets,
    weeks: Buckets,
    months: Buckets,
}

impl TemporalIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` under every bucket in `buckets`.
    pub fn insert(&mut self, id: &EventId, buckets: &EventBuckets) {
        for day in &buckets.days {
            self.days.entry(*day).or_default().insert(id.clone());
        }
        self.weeks
            .entry(buckets.week)
            .or_default()
            .insert(id.clone());
        self.months
            .entry(buckets.month)
            .or_default()
            .insert(id.clone());
    }

    /// Removes `id` from every bucket in `buckets`, pruning buckets left
    /// empty.
    pub fn remove(&mut self, id: &EventId, buckets: &EventBuckets) {
        for day in &buckets.days {
            remove_from(&mut self.days, *day, id);
        }
        remove_from(&mut self.weeks, buckets.week, id);
        remove_from(&mut self.months, buckets.month, id);
    }

    /// Identifiers registered under the day bucket `day`.
    pub fn day(&self, day: NaiveDate) -> impl Iterator<Item = &EventId> {
        self.days.get(&day).into_iter().flatten()
    }

    /// Identifiers registered under the week bucket keyed by `week_start`.
    pub fn week(&self, week_start: NaiveDate) -> impl Iterator<Item = &EventId> {
        self.weeks.get(&week_start).into_iter().flatten()
    }

    /// Identifiers registered under the month bucket keyed by `month_start`.
    pub fn month(&self, month_start: NaiveDate) -> impl Iterator<Item = &EventId> {
        self.months.get(&month_start).into_iter().flatten()
    }

    /// Total number of non-empty buckets across all granularities.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.days.len() + self.weeks.len() + self.months.len()
    }
}

fn remove_from(buckets: &mut Buckets, key: NaiveDate, id: &EventId) {
    if let Some(ids) = buckets.get_mut(&key) {
        ids.remove(id);
        if ids.is_empty() {
            buckets.remove(&key);
        }
    }
}
