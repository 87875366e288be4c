//! Feed parsers producing an [`ObservationSeries`] for one region.

mod count;
pub mod cumulative;
pub mod date;
pub mod tabular;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ParseError;
use crate::series::ObservationSeries;

pub use cumulative::parse_cumulative;
pub use tabular::parse_tabular;

/// Layout of the source feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedShape {
    /// CSV, one row per region per day, daily counts.
    #[default]
    Tabular,
    /// JSON, one record per day, running totals keyed by region.
    Cumulative,
}

impl FromStr for FeedShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tabular" | "csv" => Ok(Self::Tabular),
            "cumulative" | "json" => Ok(Self::Cumulative),
            other => Err(format!(
                "unknown feed shape '{other}' (expected 'tabular' or 'cumulative')"
            )),
        }
    }
}

impl fmt::Display for FeedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tabular => "tabular",
            Self::Cumulative => "cumulative",
        })
    }
}

/// Parses `raw` according to `shape`, keeping only `region`.
///
/// # Errors
///
/// See [`parse_tabular`] and [`parse_cumulative`].
pub fn parse(raw: &str, region: &str, shape: FeedShape) -> Result<ObservationSeries, ParseError> {
    match shape {
        FeedShape::Tabular => parse_tabular(raw, region),
        FeedShape::Cumulative => parse_cumulative(raw, region),
    }
}
