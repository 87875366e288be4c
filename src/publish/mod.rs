//! Rendering and delivery of the fortnightly summary to webhook endpoints.
//!
//! Every destination is posted to independently. A failed delivery is
//! recorded in its [`DeliveryOutcome`] and never stops the others.

pub mod discord;
pub mod embed;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{Instrument, error, info};

use crate::fetch::HttpClient;
use discord::{WebhookPayload, execute_webhook};

pub use embed::render;

/// A post ready to send: title, description and labeled fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSummary {
    pub title: String,
    pub description: String,
    pub fields: Vec<SummaryField>,
    /// Link attached to the post's author line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
}

impl RenderedSummary {
    pub fn with_author_url(mut self, url: Option<String>) -> Self {
        self.author_url = url;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl SummaryField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered { message_id: Option<String> },
    Failed { error: String },
}

/// Result of posting to one destination. `destination` is redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub destination: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered { .. })
    }
}

/// Posts `summary` to every destination concurrently.
///
/// Outcomes come back in the order of `destinations`.
pub async fn publish<C: HttpClient + 'static>(
    client: Arc<C>,
    summary: &RenderedSummary,
    destinations: &[String],
) -> Vec<DeliveryOutcome> {
    info!(destinations = destinations.len(), "Announcing summary");

    let timestamp = Utc::now();
    let body = match serde_json::to_value(WebhookPayload::new(summary, timestamp)) {
        Ok(body) => Arc::new(body),
        Err(e) => {
            error!(error = %e, "Failed to serialize webhook payload");
            return destinations
                .iter()
                .map(|d| DeliveryOutcome {
                    destination: redact_url(d),
                    status: DeliveryStatus::Failed {
                        error: e.to_string(),
                    },
                })
                .collect();
        }
    };

    let mut tasks = Vec::with_capacity(destinations.len());

    for url in destinations {
        let client = client.clone();
        let body = body.clone();
        let url = url.clone();
        let destination = redact_url(&url);

        let span = tracing::info_span!("deliver", destination = %destination);

        let task = tokio::spawn(
            async move {
                match execute_webhook(&*client, &url, &*body).await {
                    Ok(message_id) => {
                        info!(message_id = ?message_id, "Delivered");
                        DeliveryStatus::Delivered { message_id }
                    }
                    Err(e) => {
                        error!(error = %e, "Delivery failed, check the webhook URL");
                        DeliveryStatus::Failed {
                            error: format!("{e:#}"),
                        }
                    }
                }
            }
            .instrument(span),
        );

        tasks.push((destination, task));
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (destination, task) in tasks {
        let status = task.await.unwrap_or_else(|e| DeliveryStatus::Failed {
            error: format!("delivery task aborted: {e}"),
        });
        outcomes.push(DeliveryOutcome {
            destination,
            status,
        });
    }

    let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
    info!(
        delivered,
        failed = outcomes.len() - delivered,
        "Announcement finished"
    );
    outcomes
}

/// Hides the secret part of a webhook URL (its last path segment and any
/// query) so it can be logged.
pub fn redact_url(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid url>".to_string();
    };

    let host = parsed.host_str().unwrap_or_default();
    let mut segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() > 1 {
        segments.pop();
        segments.push("***");
    }

    if segments.is_empty() {
        format!("{}://{}", parsed.scheme(), host)
    } else {
        format!("{}://{}/{}", parsed.scheme(), host, segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeWebhooks {
        requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait]
    impl HttpClient for FakeWebhooks {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let body = req
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| serde_json::from_slice(b).unwrap())
                .unwrap_or_default();
            self.requests
                .lock()
                .unwrap()
                .push((req.url().to_string(), body));

            let resp = if req.url().path().contains("broken") {
                http::Response::builder().status(500).body("boom").unwrap()
            } else {
                http::Response::builder()
                    .status(200)
                    .body(r#"{"id": "1140"}"#)
                    .unwrap()
            };
            Ok(reqwest::Response::from(resp))
        }
    }

    fn summary() -> RenderedSummary {
        RenderedSummary {
            title: "Fortnightly averages".into(),
            description: "Between a and b".into(),
            fields: vec![SummaryField::new("Average of deaths:", "`1.0`").inline()],
            author_url: None,
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_others() {
        let client = Arc::new(FakeWebhooks::default());
        let destinations = vec![
            "https://chat.example/api/webhooks/1/aaa".to_string(),
            "https://chat.example/api/webhooks/broken/bbb".to_string(),
            "https://chat.example/api/webhooks/3/ccc".to_string(),
        ];

        let outcomes = publish(client.clone(), &summary(), &destinations).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0],
            DeliveryOutcome {
                destination: "https://chat.example/api/webhooks/1/***".into(),
                status: DeliveryStatus::Delivered {
                    message_id: Some("1140".into())
                },
            }
        );
        assert!(!outcomes[1].is_delivered());
        assert_eq!(outcomes[1].destination, "https://chat.example/api/webhooks/broken/***");
        assert!(outcomes[2].is_delivered());

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        for (url, body) in requests.iter() {
            assert!(url.ends_with("?wait=true"), "{url}");
            assert_eq!(body["embeds"][0]["title"], "Fortnightly averages");
        }
    }

    #[tokio::test]
    async fn test_invalid_destination_is_reported() {
        let client = Arc::new(FakeWebhooks::default());
        let outcomes = publish(client.clone(), &summary(), &["not a url".to_string()]).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].destination, "<invalid url>");
        assert!(matches!(outcomes[0].status, DeliveryStatus::Failed { .. }));
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_destinations() {
        let outcomes = publish(Arc::new(FakeWebhooks::default()), &summary(), &[]).await;
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://discord.com/api/webhooks/123/secret-token?x=1"),
            "https://discord.com/api/webhooks/123/***"
        );
        assert_eq!(redact_url("https://hooks.example/"), "https://hooks.example");
        assert_eq!(redact_url("https://hooks.example/one"), "https://hooks.example/one");
        assert_eq!(redact_url("::"), "<invalid url>");
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = DeliveryOutcome {
            destination: "https://hooks.example/***".into(),
            status: DeliveryStatus::Failed {
                error: "HTTP status 500".into(),
            },
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "destination": "https://hooks.example/***",
                "status": "failed",
                "error": "HTTP status 500"
            })
        );
    }
}
