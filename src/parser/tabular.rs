//! Row-per-day CSV feeds (`state,date,confirmed,deaths,...`).

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, warn};

use super::count::parse_count;
use super::date::{parse_date, strip_quotes};
use crate::error::ParseError;
use crate::series::{Observation, ObservationSeries};

pub const STATE_COLUMN: &str = "state";
pub const DATE_COLUMN: &str = "date";
pub const CONFIRMED_COLUMN: &str = "confirmed";
pub const DEATHS_COLUMN: &str = "deaths";

/// A single CSV row. Columns other than these four are ignored.
#[derive(Debug, Deserialize)]
struct TabularRow {
    state: String,
    date: String,
    confirmed: Option<String>,
    deaths: Option<String>,
}

/// Parses a tabular feed, keeping only rows whose `state` is `region`.
///
/// Counts are daily figures. A malformed count reads as `0`; a row with an
/// unparseable date, or one the CSV reader cannot decode, is skipped.
///
/// # Errors
///
/// Fails when the header lacks a required column or when no row matches
/// `region`.
pub fn parse_tabular(raw: &str, region: &str) -> Result<ObservationSeries, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let headers = rdr.headers()?.clone();
    for required in [STATE_COLUMN, DATE_COLUMN, CONFIRMED_COLUMN, DEATHS_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(ParseError::MissingColumn(required.to_string()));
        }
    }

    let mut matched = 0usize;
    let mut observations = Vec::new();

    for (line, result) in rdr.deserialize::<TabularRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping undecodable row");
                continue;
            }
        };

        if strip_quotes(&row.state) != region {
            continue;
        }
        matched += 1;

        let Some(date) = parse_date(&row.date) else {
            warn!(line = line + 2, date = %row.date, "Skipping row with unparseable date");
            continue;
        };

        observations.push(Observation::new(
            date,
            count_or_zero(row.confirmed.as_deref(), CONFIRMED_COLUMN, line),
            count_or_zero(row.deaths.as_deref(), DEATHS_COLUMN, line),
        ));
    }

    if matched == 0 {
        return Err(ParseError::EmptyRegionData {
            region: region.to_string(),
        });
    }

    debug!(matched, kept = observations.len(), "Tabular rows parsed");
    Ok(ObservationSeries::new(observations))
}

fn count_or_zero(raw: Option<&str>, column: &str, line: usize) -> u64 {
    match raw.and_then(parse_count) {
        Some(n) => n,
        None => {
            debug!(line = line + 2, column, value = ?raw, "Malformed count, using 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filters_region_and_sorts_ascending() {
        let raw = "\
date,state,state_abbrev,confirmed,deaths
2020-08-03,Victoria,VIC,300,12
2020-08-03,New South Wales,NSW,10,0
2020-08-02,Victoria,VIC,200,8
2020-08-02,New South Wales,NSW,11,1
2020-08-01,Victoria,VIC,100,4
";
        let series = parse_tabular(raw, "Victoria").unwrap();
        assert_eq!(
            series.as_slice(),
            &[
                Observation::new(ymd(2020, 8, 1), 100, 4),
                Observation::new(ymd(2020, 8, 2), 200, 8),
                Observation::new(ymd(2020, 8, 3), 300, 12),
            ]
        );
    }

    #[test]
    fn test_non_numeric_confirmed_reads_as_zero() {
        let raw = "\
state,date,confirmed,deaths
Victoria,2020-08-01,n/a,2
Victoria,2020-08-02,,
Victoria,2020-08-03,7,1
";
        let series = parse_tabular(raw, "Victoria").unwrap();
        let counts: Vec<_> = series
            .as_slice()
            .iter()
            .map(|o| (o.new_case_count, o.death_count))
            .collect();
        assert_eq!(counts, vec![(0, 2), (0, 0), (7, 1)]);
    }

    #[test]
    fn test_region_match_is_case_sensitive() {
        let raw = "state,date,confirmed,deaths\nvictoria,2020-08-01,1,0\n";
        let err = parse_tabular(raw, "Victoria").unwrap_err();
        assert!(matches!(err, ParseError::EmptyRegionData { region } if region == "Victoria"));
    }

    #[test]
    fn test_quoting_artifacts_are_stripped() {
        let raw = "state,date,confirmed,deaths\n\"\"\"Victoria\"\"\",2020-08-01,5,0\n";
        let series = parse_tabular(raw, "Victoria").unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_bad_date_row_is_skipped() {
        let raw = "\
state,date,confirmed,deaths
Victoria,not-a-date,99,9
Victoria,01/08/2020,5,0
";
        let series = parse_tabular(raw, "Victoria").unwrap();
        assert_eq!(series.as_slice(), &[Observation::new(ymd(2020, 8, 1), 5, 0)]);
    }

    #[test]
    fn test_duplicate_dates_keep_last_row() {
        let raw = "\
state,date,confirmed,deaths
Victoria,2020-08-01,5,0
Victoria,2020-08-01,6,1
";
        let series = parse_tabular(raw, "Victoria").unwrap();
        assert_eq!(series.as_slice(), &[Observation::new(ymd(2020, 8, 1), 6, 1)]);
    }

    #[test]
    fn test_missing_column() {
        let raw = "state,date,confirmed\nVictoria,2020-08-01,5\n";
        let err = parse_tabular(raw, "Victoria").unwrap_err();
        assert!(matches!(err, ParseError::MissingColumn(c) if c == "deaths"));
    }
}
