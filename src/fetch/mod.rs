mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// GETs `url` and returns the body as text.
///
/// # Errors
///
/// Fails on an invalid URL, a transport error, or a non-success status.
pub async fn fetch_text<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<String> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid URL '{url}'"))?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    let body = resp.text().await?;
    debug!(bytes = body.len(), "Response body received");
    Ok(body)
}

/// Loads text from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient + ?Sized>(client: &C, source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_text(client, source).await
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read '{source}'"))
    }
}
