//! CLI entry point: computes the fortnightly Covid-19 averages for one region
//! and announces them to the configured webhooks.
//!
//! Meant to be invoked once per run by an external scheduler.

use anyhow::Result;
use clap::Parser;
use covid_fortnight::{
    fetch::BasicClient,
    output::{print_json, print_pretty},
    parser::FeedShape,
    pipeline::{DEFAULT_FEED_URL, DEFAULT_REGION, RunConfig, run},
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_fortnight")]
#[command(about = "Publish fortnightly Covid-19 averages for a region", long_about = None)]
struct Cli {
    /// Region name (tabular feeds) or region key (cumulative feeds)
    #[arg(long, env = "REGION_NAME", default_value = DEFAULT_REGION)]
    region: String,

    /// URL or local path of the case feed
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// Feed layout: "tabular" (CSV, daily counts) or "cumulative" (JSON, running totals)
    #[arg(long, env = "FEED_SHAPE", default_value_t = FeedShape::Tabular)]
    feed_shape: FeedShape,

    /// Comma-separated webhook URLs to announce to
    #[arg(long, env = "DISCORD_WEBHOOK_URLS", value_delimiter = ',')]
    webhook_urls: Vec<String>,

    /// Page to scrape the unknown-source case count from
    #[arg(long, env = "SCRAPE_URL")]
    scrape_url: Option<String>,

    /// Project page linked from the post's author line
    #[arg(long, env = "PROJECT_URL")]
    project_url: Option<String>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Compute and print the summary without publishing
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Also print the run report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            region: self.region,
            feed_url: self.feed_url,
            feed_shape: self.feed_shape,
            webhook_urls: self
                .webhook_urls
                .into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            scrape_url: self.scrape_url.filter(|u| !u.trim().is_empty()),
            project_url: self.project_url.filter(|u| !u.trim().is_empty()),
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/covid_fortnight.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_fortnight.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let client = Arc::new(BasicClient::new(Duration::from_secs(cli.timeout_secs))?);
    let config = cli.into_config();

    if !config.dry_run && config.webhook_urls.is_empty() {
        anyhow::bail!("no webhook URLs configured; set DISCORD_WEBHOOK_URLS or pass --dry-run");
    }
    info!(
        region = %config.region,
        shape = %config.feed_shape,
        destinations = config.webhook_urls.len(),
        "Configuration loaded"
    );

    let report = match run(client, &config).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Run aborted, nothing published");
            return Err(e.into());
        }
    };

    print_pretty(&report);
    if json {
        print_json(&report)?;
    }

    Ok(())
}
