use chrono::NaiveDate;
use serde::Serialize;

use crate::error::StatsError;
use crate::series::ObservationSeries;

/// Length of the trailing window, in observations.
pub const FORTNIGHT: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub new_cases_today: u64,
    pub avg_new_cases: f64,
    pub avg_deaths: f64,
}

impl RollingSummary {
    /// Computes the summary over the last [`FORTNIGHT`] observations.
    ///
    /// Sums are exact; the division and rounding to one decimal place
    /// (half away from zero) happen once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InsufficientHistory`] for fewer than
    /// [`FORTNIGHT`] observations.
    pub fn from_series(series: &ObservationSeries) -> Result<Self, StatsError> {
        let obs = series.as_slice();
        if obs.len() < FORTNIGHT {
            return Err(StatsError::InsufficientHistory {
                required: FORTNIGHT,
                available: obs.len(),
            });
        }

        let window = &obs[obs.len() - FORTNIGHT..];
        let first = &window[0];
        let last = &window[FORTNIGHT - 1];

        let case_sum: u64 = window.iter().map(|o| o.new_case_count).sum();
        let death_sum: u64 = window.iter().map(|o| o.death_count).sum();

        Ok(RollingSummary {
            period_start: first.date,
            period_end: last.date,
            new_cases_today: last.new_case_count,
            avg_new_cases: mean_one_decimal(case_sum, FORTNIGHT as u64),
            avg_deaths: mean_one_decimal(death_sum, FORTNIGHT as u64),
        })
    }
}

/// Summarizes the trailing fortnight of `series`.
pub fn summarize(series: &ObservationSeries) -> Result<RollingSummary, StatsError> {
    RollingSummary::from_series(series)
}

/// `sum / count` rounded half away from zero to one decimal place, computed
/// in integer tenths so exact `.x5` boundaries are never misrounded.
pub fn mean_one_decimal(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let sum = u128::from(sum);
    let count = u128::from(count);
    let tenths = (sum * 20 + count) / (count * 2);
    tenths as f64 / 10.0
}
