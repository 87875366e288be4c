//! JSON time series of running totals keyed by region code.
//!
//! ```json
//! [
//!   { "Date": "2020-08-01", "VIC": 10, "VIC_Deaths": 1, "NSW": 4 },
//!   { "Date": "2020-08-02", "VIC": 15, "VIC_Deaths": 1, "NSW": 6 }
//! ]
//! ```
//!
//! The same array wrapped as `{"data": [...]}` is also accepted.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use super::count::count_from_json;
use super::date::{date_from_timestamp, parse_date};
use crate::error::ParseError;
use crate::series::{Observation, ObservationSeries, sort_dedup_last};

pub const DATE_KEY: &str = "Date";
pub const DEATHS_SUFFIX: &str = "_Deaths";

struct CumulativeRecord {
    date: NaiveDate,
    cases: Option<u64>,
    deaths: Option<u64>,
}

/// Parses a cumulative feed and converts running totals into daily deltas.
///
/// The earliest record with a valid case total only serves as the baseline
/// for the next day's delta and is not part of the returned series; records
/// before it are dropped. Deaths take their baseline from the first valid
/// deaths total, reporting `0` until then. A missing or malformed total
/// repeats the previous day's total, and a total that drops (a downward
/// revision) yields a delta of `0`.
///
/// # Errors
///
/// Any record with an unparseable `Date` is fatal. Fails with
/// [`ParseError::EmptyRegionData`] when no record carries `region`.
pub fn parse_cumulative(raw: &str, region: &str) -> Result<ObservationSeries, ParseError> {
    let root: Value = serde_json::from_str(raw)?;
    let items = match &root {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ParseError::UnexpectedShape(
                    "expected an array or an object with a \"data\" array".into(),
                ));
            }
        },
        _ => return Err(ParseError::UnexpectedShape("expected a JSON array".into())),
    };

    let deaths_key = format!("{region}{DEATHS_SUFFIX}");
    let mut records = Vec::new();

    for item in items {
        let Value::Object(obj) = item else {
            return Err(ParseError::UnexpectedShape("record is not an object".into()));
        };

        let date = record_date(obj.get(DATE_KEY))?;

        let Some(cases) = obj.get(region) else {
            continue;
        };

        records.push(CumulativeRecord {
            date,
            cases: count_from_json(cases),
            deaths: obj.get(&deaths_key).and_then(count_from_json),
        });
    }

    if records.is_empty() {
        return Err(ParseError::EmptyRegionData {
            region: region.to_string(),
        });
    }

    let records = sort_dedup_last(records, |r| r.date);
    let observations = daily_deltas(&records);

    debug!(
        records = records.len(),
        observations = observations.len(),
        "Cumulative records converted to daily deltas"
    );
    Ok(ObservationSeries::new(observations))
}

fn record_date(value: Option<&Value>) -> Result<NaiveDate, ParseError> {
    let parsed = match value {
        Some(Value::String(s)) => parse_date(s),
        Some(Value::Number(n)) => n.as_i64().and_then(date_from_timestamp),
        _ => None,
    };

    parsed.ok_or_else(|| ParseError::InvalidDate {
        value: value.map_or_else(|| "<missing>".to_string(), |v| v.to_string()),
    })
}

fn daily_deltas(records: &[CumulativeRecord]) -> Vec<Observation> {
    // Records before the first valid case total have nothing to difference
    // against and are dropped along with the baseline itself.
    let Some(start) = records.iter().position(|r| r.cases.is_some()) else {
        return Vec::new();
    };
    if start > 0 {
        warn!(
            skipped = start,
            "Leading records have no case total, using the first valid one as baseline"
        );
    }
    let (baseline, rest) = (&records[start], &records[start + 1..]);

    let mut prev_cases = baseline.cases.unwrap_or_default();
    let mut prev_deaths = baseline.deaths;

    rest.iter()
        .map(|r| {
            let cases = r.cases.unwrap_or(prev_cases);
            let deaths = r.deaths.or(prev_deaths);

            // No death baseline yet: this record becomes it.
            let death_delta = match (prev_deaths, deaths) {
                (Some(prev), Some(cur)) => cur.saturating_sub(prev),
                _ => 0,
            };

            if cases < prev_cases || deaths < prev_deaths {
                warn!(
                    date = %r.date,
                    cases,
                    prev_cases,
                    deaths = ?deaths,
                    prev_deaths = ?prev_deaths,
                    "Cumulative total decreased, clamping delta to 0"
                );
            }

            let obs = Observation::new(r.date, cases.saturating_sub(prev_cases), death_delta);
            prev_cases = cases;
            prev_deaths = deaths;
            obs
        })
        .collect()
}
