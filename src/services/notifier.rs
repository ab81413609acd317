use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::NotifierConfig;

/// Delivers text to a chat user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notifier request timed out")]
    Timeout,
    #[error("notifier network error: {0}")]
    Network(String),
    #[error("notifier rejected message: status={status}")]
    Rejected { status: u16 },
}

/// Fire-and-forget delivery: failures are logged and never retried.
pub async fn notify(notifier: &dyn Notifier, user_id: i64, text: &str) {
    if let Err(e) = notifier.deliver(user_id, text).await {
        tracing::warn!(user_id, error = %e, "Failed to deliver message");
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundMessage<'a> {
    user_id: i64,
    text: &'a str,
}

/// Posts `{ "userId", "text" }` JSON to a chat gateway.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&OutboundMessage { user_id, text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Used when no gateway is configured; messages only reach the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        tracing::info!(user_id, text, "Outbound message");
        Ok(())
    }
}

pub fn from_config(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url, config.timeout_secs)),
        None => {
            tracing::warn!("NOTIFIER_WEBHOOK_URL not set, outbound messages are only logged");
            Arc::new(LogNotifier)
        }
    }
}
