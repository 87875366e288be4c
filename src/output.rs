//! Console reporting for a finished run.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::pipeline::RunReport;
use crate::publish::DeliveryStatus;
use crate::publish::embed::long_date;

const RULE: &str = "~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~";

/// Logs the summary banner and one line per delivery.
pub fn print_pretty(report: &RunReport) {
    let s = &report.summary;
    info!("{RULE}");
    info!("Fortnightly averages for Covid-19 for {}", report.region);
    info!(
        "Between {} and {}",
        long_date(s.period_start),
        long_date(s.period_end)
    );
    info!("New cases today: {}", s.new_cases_today);
    info!("Average new cases: {:.1}", s.avg_new_cases);
    info!("Average deaths: {:.1}", s.avg_deaths);
    match &report.transmission {
        Some(t) => info!(
            "Unknown source ({}): {}",
            t.date_range_label, t.unknown_source_count
        ),
        None => debug!("No transmission stat for this run"),
    }
    info!("{RULE}");

    for outcome in &report.deliveries {
        match &outcome.status {
            DeliveryStatus::Delivered { message_id } => info!(
                destination = %outcome.destination,
                message_id = message_id.as_deref().unwrap_or("-"),
                "Delivered"
            ),
            DeliveryStatus::Failed { error } => warn!(
                destination = %outcome.destination,
                error = %error,
                "Not delivered"
            ),
        }
    }
}

/// Logs the report as pretty-printed JSON.
pub fn print_json(report: &RunReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
