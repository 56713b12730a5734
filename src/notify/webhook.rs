use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use crate::registry::Origin;

use super::Notifier;

/// Posts status messages as JSON to a generic webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, origin))]
    async fn send(&self, origin: &Origin, text: &str) -> anyhow::Result<()> {
        let payload = json!({
            "message": text,
            "user": origin.user,
            "channel": origin.channel,
            "thread": origin.timestamp,
            "timestamp": Utc::now().to_rfc3339()
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("failed to send webhook request")?;

        if !response.status().is_success() {
            anyhow::bail!("webhook failed with status: {}", response.status());
        }

        debug!("successfully sent webhook message");
        Ok(())
    }
}
