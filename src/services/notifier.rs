//! Notification sinks.
//!
//! Delivery is best-effort. Callers log a failed [`Notifier::notify`] and move
//! on; nothing is retried.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, NotifierConfig};
use crate::utils::http;

/// Sink for human-readable alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Build the sink described by the configuration.
///
/// Without a webhook URL, alerts only go to the log.
pub fn from_config(config: &Config) -> Result<Box<dyn Notifier>> {
    match config.notifier.webhook() {
        Some(url) => {
            let client = http::create_async_client(&config.feed)?;
            Ok(Box::new(WebhookNotifier::new(client, url, &config.notifier)))
        }
        None => {
            log::warn!("No webhook configured; notifications will only be logged");
            Ok(Box::new(LogNotifier))
        }
    }
}

/// Slack-compatible incoming webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    footer: String,
    footer_icon: String,
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    attachments: [Attachment<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    color: &'a str,
    text: &'a str,
    footer: &'a str,
    footer_icon: &'a str,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>, config: &NotifierConfig) -> Self {
        Self {
            client,
            url: url.into(),
            footer: config.footer.clone(),
            footer_icon: config.footer_icon.clone(),
        }
    }

    fn payload<'a>(&'a self, message: &'a str) -> WebhookMessage<'a> {
        WebhookMessage {
            attachments: [Attachment {
                color: "good",
                text: message,
                footer: &self.footer,
                footer_icon: &self.footer_icon,
            }],
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(message))
            .send()
            .await
            .map_err(AppError::notify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "webhook returned {status}: {}",
                body.trim()
            )));
        }
        Ok(())
    }
}

/// Writes alerts to the log only.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        log::info!("[notify] {}", message);
        Ok(())
    }
}

/// Collects alerts in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, in delivery order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages
            .lock()
            .map_err(AppError::notify)?
            .push(message.to_string());
        Ok(())
    }
}
