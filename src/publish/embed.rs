//! Turns computed figures into the title, description and fields of a post.

use chrono::NaiveDate;

use super::{RenderedSummary, SummaryField};
use crate::scrape::TransmissionStat;
use crate::stats::RollingSummary;

const BLANK: &str = "\u{200B}";
const DATE_FORMAT: &str = "%A, %d %B %Y";

/// Formats like `Wednesday, 05 August 2020`.
pub fn long_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn render(
    summary: &RollingSummary,
    transmission: Option<&TransmissionStat>,
    region: &str,
    source_url: &str,
) -> RenderedSummary {
    let mut fields = vec![
        SummaryField::new(BLANK, BLANK),
        SummaryField::new(
            "New cases in the last 24 hours:",
            format!("`{}`", summary.new_cases_today),
        ),
        SummaryField::new("Average of new cases:", format!("`{:.1}`", summary.avg_new_cases))
            .inline(),
        SummaryField::new("Average of deaths:", format!("`{:.1}`", summary.avg_deaths)).inline(),
    ];

    if let Some(stat) = transmission {
        fields.push(SummaryField::new(
            format!("Cases with unknown source ({}):", stat.date_range_label),
            format!("`{}`", stat.unknown_source_count),
        ));
    }

    fields.push(SummaryField::new(BLANK, BLANK));
    fields.push(SummaryField::new(
        "📉 Data gathered from",
        format!("[{}]({source_url})", source_host(source_url)),
    ));

    RenderedSummary {
        title: format!("Fortnightly averages for Covid-19 for {region}"),
        description: format!(
            "Between `{}` and `{}`",
            long_date(summary.period_start),
            long_date(summary.period_end)
        ),
        fields,
        author_url: None,
    }
}

fn source_host(source_url: &str) -> String {
    reqwest::Url::parse(source_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| source_url.to_string())
}
