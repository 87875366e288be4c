//! Discord-compatible webhook execution.

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{RenderedSummary, SummaryField};
use crate::fetch::HttpClient;

const AUTHOR_NAME: &str = "Covid-19 fortnight tracker";
const FOOTER_TEXT: &str = "Wear a mask 😷";
const EMBED_COLOR: u32 = 0x2E86C1;

#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct Embed<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub color: u32,
    pub author: EmbedText<'a>,
    pub fields: &'a [SummaryField],
    pub footer: EmbedText<'a>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EmbedText<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(summary: &'a RenderedSummary, timestamp: DateTime<Utc>) -> Self {
        Self {
            embeds: [Embed {
                title: &summary.title,
                description: &summary.description,
                color: EMBED_COLOR,
                author: EmbedText {
                    name: Some(AUTHOR_NAME),
                    url: summary.author_url.as_deref(),
                    text: None,
                },
                fields: &summary.fields,
                footer: EmbedText {
                    name: None,
                    url: None,
                    text: Some(FOOTER_TEXT),
                },
                timestamp,
            }],
        }
    }
}

/// The part of the created message we report back.
#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Posts `payload` to one webhook and returns the created message id, when
/// the endpoint sends one back.
pub async fn execute_webhook<C: HttpClient + ?Sized>(
    client: &C,
    webhook_url: &str,
    payload: &impl Serialize,
) -> Result<Option<String>> {
    let mut url: reqwest::Url = webhook_url.parse()?;
    // Without `wait` the endpoint answers 204 and no message id.
    url.query_pairs_mut().append_pair("wait", "true");

    let mut req = reqwest::Request::new(reqwest::Method::POST, url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(payload)?.into());

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.json::<CreatedMessage>().await.ok().map(|m| m.id))
}
