//! One run: fetch, parse, summarize, scrape, publish.
//!
//! Fetch, parse and summary failures abort the run before anything is
//! published. The scrape and each delivery fail on their own without
//! affecting the rest.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::fetch::{HttpClient, load_source};
use crate::parser::{FeedShape, parse};
use crate::publish::{DeliveryOutcome, RenderedSummary, publish, render};
use crate::scrape::{TransmissionStat, scrape_optional};
use crate::stats::{RollingSummary, summarize};

pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/M3IT/COVID-19_Data/master/Data/COVID_AU_state.csv";
pub const DEFAULT_REGION: &str = "Victoria";

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Value matched against the feed's region column or key.
    pub region: String,
    /// URL or local path of the case feed.
    pub feed_url: String,
    pub feed_shape: FeedShape,
    pub webhook_urls: Vec<String>,
    /// Page carrying the unknown-source statistic; skipped when `None`.
    pub scrape_url: Option<String>,
    /// Linked from the post's author line.
    pub project_url: Option<String>,
    /// Compute and report but do not publish.
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_shape: FeedShape::Tabular,
            webhook_urls: Vec::new(),
            scrape_url: None,
            project_url: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub region: String,
    pub summary: RollingSummary,
    pub transmission: Option<TransmissionStat>,
    pub rendered: RenderedSummary,
    pub deliveries: Vec<DeliveryOutcome>,
}

/// Runs the whole pipeline once.
///
/// # Errors
///
/// Returns a [`PipelineError`] when the feed cannot be fetched, parsed, or
/// holds too little history. Scrape and delivery failures are not errors;
/// they show up as a missing `transmission` and in `deliveries`.
#[tracing::instrument(skip_all, fields(region = %config.region, shape = %config.feed_shape))]
pub async fn run<C: HttpClient + 'static>(
    client: Arc<C>,
    config: &RunConfig,
) -> Result<RunReport, PipelineError> {
    info!(source = %config.feed_url, "Fetching case feed");
    let raw = load_source(&*client, &config.feed_url)
        .await
        .map_err(PipelineError::Fetch)?;
    info!(bytes = raw.len(), "Case feed received");

    let series = parse(&raw, &config.region, config.feed_shape)?;
    info!(observations = series.len(), "Case feed parsed");

    let summary = summarize(&series)?;
    info!(
        period_start = %summary.period_start,
        period_end = %summary.period_end,
        new_cases_today = summary.new_cases_today,
        avg_new_cases = summary.avg_new_cases,
        avg_deaths = summary.avg_deaths,
        "Fortnight summarized"
    );

    let transmission = match &config.scrape_url {
        Some(url) => scrape_stage(&*client, url).await,
        None => {
            info!("No scrape URL configured, skipping transmission stat");
            None
        }
    };

    let rendered = render(
        &summary,
        transmission.as_ref(),
        &config.region,
        &config.feed_url,
    )
    .with_author_url(config.project_url.clone());

    let deliveries = if config.dry_run {
        info!("Dry run, not publishing");
        Vec::new()
    } else if config.webhook_urls.is_empty() {
        warn!("No webhook destinations configured, nothing published");
        Vec::new()
    } else {
        publish(client, &rendered, &config.webhook_urls).await
    };

    Ok(RunReport {
        region: config.region.clone(),
        summary,
        transmission,
        rendered,
        deliveries,
    })
}

/// Fetches and scrapes the supplementary page. Never fails the run.
async fn scrape_stage<C: HttpClient + ?Sized>(client: &C, url: &str) -> Option<TransmissionStat> {
    info!(source = %url, "Scraping transmission stat");
    match load_source(client, url).await {
        Ok(page) => {
            let stat = scrape_optional(&page);
            if let Some(stat) = &stat {
                info!(
                    unknown_source = %stat.unknown_source_count,
                    range = %stat.date_range_label,
                    "Transmission stat scraped"
                );
            }
            stat
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Transmission page fetch failed");
            None
        }
    }
}
