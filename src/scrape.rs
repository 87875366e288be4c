//! Best-effort scrape of the "unknown source" case count from the health
//! department's daily update page.
//!
//! The page has no structural contract, so this is a plain substring and
//! pattern search pinned to the page's current wording. Expect it to break
//! without notice; callers go through [`scrape_optional`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ScrapeError;

pub const UNKNOWN_SOURCE_LABEL: &str = "Number of cases - unknown source";
pub const DATE_RANGE_LABEL: &str = "For the last 14 days";

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("count pattern is valid"));
static PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("paren pattern is valid"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransmissionStat {
    pub date_range_label: String,
    pub unknown_source_count: String,
}

/// Extracts the unknown-source count and its reporting date range.
///
/// The date range label appears twice on the page; the range is taken from
/// the parenthesized text after the second occurrence.
pub fn scrape_transmission_stat(page: &str) -> Result<TransmissionStat, ScrapeError> {
    let label_at = page
        .find(UNKNOWN_SOURCE_LABEL)
        .ok_or(ScrapeError::LabelNotFound)?;
    let after_label = &page[label_at + UNKNOWN_SOURCE_LABEL.len()..];

    let unknown_source_count = COUNT_RE
        .find(after_label)
        .ok_or(ScrapeError::CountNotFound)?
        .as_str()
        .to_string();

    let range_at = page
        .match_indices(DATE_RANGE_LABEL)
        .nth(1)
        .map(|(i, _)| i)
        .ok_or(ScrapeError::DateRangeNotFound)?;

    let raw_range = PAREN_RE
        .captures(&page[range_at..])
        .and_then(|c| c.get(1))
        .ok_or(ScrapeError::DateRangeNotFound)?
        .as_str();

    Ok(TransmissionStat {
        date_range_label: normalize_ws(&decode_entities(raw_range)),
        unknown_source_count,
    })
}

/// Runs [`scrape_transmission_stat`], logging any failure and returning `None`.
pub fn scrape_optional(page: &str) -> Option<TransmissionStat> {
    match scrape_transmission_stat(page) {
        Ok(stat) => {
            debug!(?stat, "Transmission stat scraped");
            Some(stat)
        }
        Err(e) => {
            warn!(error = %e, "Transmission stat unavailable");
            None
        }
    }
}

/// Decodes the HTML entities found in date text: the common named ones and
/// numeric references. Unknown entities are left untouched.
pub fn decode_entities(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let entity = &caps[1];
            decode_entity(entity).map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        _ => return None,
    };
    Some(c)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<h2>Daily update</h2>
<p>Number of cases - unknown source</p><p><strong>37</strong> cases</p>
<p>For the last 14 days (summary below)</p>
<table><tr><td>For the last 14 days</td><td>(1&nbsp;Jan - 14&nbsp;Jan)</td></tr></table>
"#;

    #[test]
    fn test_scrape_extracts_count_and_second_range() {
        let stat = scrape_transmission_stat(PAGE).unwrap();
        assert_eq!(stat.unknown_source_count, "37");
        assert_eq!(stat.date_range_label, "1 Jan - 14 Jan");
    }

    #[test]
    fn test_count_keeps_thousands_separator() {
        let page = PAGE.replace("<strong>37</strong>", "<strong>1,204</strong>");
        let stat = scrape_transmission_stat(&page).unwrap();
        assert_eq!(stat.unknown_source_count, "1,204");
    }

    #[test]
    fn test_missing_label() {
        let page = "<p>Nothing to see here (1 Jan - 14 Jan)</p>";
        assert_eq!(
            scrape_transmission_stat(page),
            Err(ScrapeError::LabelNotFound)
        );
        assert_eq!(scrape_optional(page), None);
    }

    #[test]
    fn test_single_date_range_label_is_not_enough() {
        let page = "Number of cases - unknown source 12 For the last 14 days (1 Jan - 14 Jan)";
        assert_eq!(
            scrape_transmission_stat(page),
            Err(ScrapeError::DateRangeNotFound)
        );
    }

    #[test]
    fn test_no_digits_after_label() {
        let page = "Number of cases - unknown source: none";
        assert_eq!(
            scrape_transmission_stat(page),
            Err(ScrapeError::CountNotFound)
        );
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("1 Jan &ndash; 14 Jan"), "1 Jan \u{2013} 14 Jan");
        assert_eq!(decode_entities("A &amp; B"), "A & B");
        assert_eq!(decode_entities("&#49; &#x32;"), "1 2");
        assert_eq!(decode_entities("&bogus; stays"), "&bogus; stays");
    }
}
