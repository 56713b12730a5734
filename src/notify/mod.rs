//! Delivery of host status messages
//!
//! The registry and the monitors only ever hand a notifier the requester's
//! [`Origin`] and a plain-text message. Implementations decide where the text
//! ends up:
//!
//! - [`LogNotifier`]: writes to the log (default, used by the console binary)
//! - [`WebhookNotifier`]: POSTs a JSON payload to a generic webhook
//! - [`DiscordNotifier`]: posts to a Discord webhook
//!
//! Delivery failures are reported back as errors; callers log them and never
//! retry.

pub mod discord;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::NotifierConfig;
use crate::registry::Origin;

pub use discord::DiscordNotifier;
pub use webhook::WebhookNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to whoever is behind `origin`
    async fn send(&self, origin: &Origin, text: &str) -> anyhow::Result<()>;
}

/// Notifier that only logs messages
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, origin: &Origin, text: &str) -> anyhow::Result<()> {
        info!(user = %origin.user, channel = %origin.channel, "{text}");
        Ok(())
    }
}

/// Build the notifier selected in the configuration
pub fn from_config(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match config {
        NotifierConfig::Log => Arc::new(LogNotifier),
        NotifierConfig::Webhook(webhook) => Arc::new(WebhookNotifier::new(webhook.url.clone())),
        NotifierConfig::Discord(discord) => Arc::new(DiscordNotifier::new(discord.url.clone())),
    }
}
