//! Daily observations for a single region.

use chrono::NaiveDate;
use serde::Serialize;

/// One calendar day's figures. Counts are daily, never cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub new_case_count: u64,
    pub death_count: u64,
}

impl Observation {
    pub fn new(date: NaiveDate, new_case_count: u64, death_count: u64) -> Self {
        Self {
            date,
            new_case_count,
            death_count,
        }
    }
}

/// Observations in strictly ascending date order.
///
/// Gaps between dates are kept as-is. When the input holds more than one
/// observation for the same date, the one that came last in the input wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Sorts `observations` by date and drops earlier duplicates.
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations: sort_dedup_last(observations, |o| o.date),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }
}

/// Stable-sorts by key and keeps the last item of each run of equal keys.
pub(crate) fn sort_dedup_last<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    // `dedup_by` keeps the first of a run, so walk it reversed.
    items.reverse();
    items.dedup_by(|a, b| key(a) == key(b));
    items.reverse();
    items
}
