//! Error types for each pipeline stage.
//!
//! Parsing and statistics failures are fatal for a run. Scrape failures are
//! reported but never cross the scraper's isolation boundary (see
//! [`crate::scrape::scrape_optional`]). Delivery failures are carried per
//! destination in [`crate::publish::DeliveryOutcome`].

use thiserror::Error;

/// Failures while turning raw feed text into an observation series.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no rows found for region '{region}'")]
    EmptyRegionData { region: String },
    #[error("unparseable date '{value}' in cumulative feed")]
    InvalidDate { value: String },
    #[error("feed is missing required column '{0}'")]
    MissingColumn(String),
    #[error("unexpected feed shape: {0}")]
    UnexpectedShape(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while computing the rolling summary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("need at least {required} daily observations, have {available}")]
    InsufficientHistory { required: usize, available: usize },
}

/// Failures of the best-effort transmission scrape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("unknown-source label not found on page")]
    LabelNotFound,
    #[error("no case count follows the unknown-source label")]
    CountNotFound,
    #[error("date range label not found twice on page")]
    DateRangeNotFound,
}

/// A fatal failure that aborts the run before anything is published.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0:#}")]
    Fetch(anyhow::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}
