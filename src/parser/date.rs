//! Lenient calendar-date parsing for feeds with inconsistent date formats.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Day-first formats come before month-first ones; the feeds are Australian.
/// Two-digit years are tried before `%Y`, which would accept `20` as year 20.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parses a date in any of the accepted formats, discarding any time of day.
///
/// Surrounding whitespace and quote characters are ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = strip_quotes(raw);
    if s.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Interprets a Unix timestamp as a UTC date. Values above 10^11 are taken to
/// be milliseconds.
pub fn date_from_timestamp(ts: i64) -> Option<NaiveDate> {
    let dt = if ts.abs() > 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    };
    dt.map(|dt| dt.date_naive())
}

/// Strips whitespace plus any `"` or `\"` wrapping left by the source encoding.
pub(crate) fn strip_quotes(raw: &str) -> &str {
    let mut s = raw.trim();
    loop {
        let next = s
            .trim_start_matches("\\\"")
            .trim_end_matches("\\\"")
            .trim_matches('"')
            .trim();
        if next.len() == s.len() {
            return s;
        }
        s = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_accepts_known_formats() {
        let expected = ymd(2020, 8, 5);
        for raw in [
            "2020-08-05",
            "2020/08/05",
            "05/08/2020",
            "5/8/2020",
            "05/08/20",
            "05-08-2020",
            "5 August 2020",
            "5 Aug 2020",
            "August 5, 2020",
            "2020-08-05T00:00:00Z",
            "2020-08-05T10:30:00+10:00",
            "2020-08-05 13:45:00",
            "2020-08-05T13:45:00.000",
            "05/08/2020 13:45",
        ] {
            assert_eq!(parse_date(raw), Some(expected), "format {raw}");
        }
    }

    #[test]
    fn test_parse_date_strips_quoting() {
        assert_eq!(parse_date("\"2020-08-05\""), Some(ymd(2020, 8, 5)));
        assert_eq!(parse_date("\\\"2020-08-05\\\""), Some(ymd(2020, 8, 5)));
        assert_eq!(parse_date("  2020-08-05 "), Some(ymd(2020, 8, 5)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2020-13-45"), None);
    }

    #[test]
    fn test_date_from_timestamp_seconds_and_millis() {
        // 2020-08-05T00:00:00Z
        assert_eq!(date_from_timestamp(1_596_585_600), Some(ymd(2020, 8, 5)));
        assert_eq!(date_from_timestamp(1_596_585_600_000), Some(ymd(2020, 8, 5)));
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\\\"Victoria\\\""), "Victoria");
        assert_eq!(strip_quotes("\"Victoria\""), "Victoria");
        assert_eq!(strip_quotes(" Victoria "), "Victoria");
        assert_eq!(strip_quotes("New South Wales"), "New South Wales");
    }
}
