use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::TranslatorConfig;

/// Translates a word between two language codes.
#[async_trait]
pub trait TranslationOracle: Send + Sync {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translator network error: {0}")]
    Network(String),
    #[error("translator returned status {0}")]
    Status(u16),
    #[error("translator returned malformed payload: {0}")]
    Malformed(String),
    #[error("translation failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&TranslatorConfig> for RetryPolicy {
    fn from(config: &TranslatorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Runs `op` until it succeeds or the policy runs out of attempts, sleeping
/// `policy.delay` between tries. Exhaustion is reported as
/// [`TranslateError::Exhausted`] carrying the last failure.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, TranslateError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TranslateError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                return Err(TranslateError::Exhausted {
                    attempts: attempt,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                tracing::debug!(attempt, max_attempts, error = %e, "Translation attempt failed, retrying");
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// Client for the public `translate_a/single` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    api_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl GoogleTranslator {
    pub fn new(config: &TranslatorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_url: config.api_url.clone(),
            client,
            retry: RetryPolicy::from(config),
        }
    }

    async fn translate_once(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", from),
                ("tl", to),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;
        parse_translation(&payload)
    }
}

#[async_trait]
impl TranslationOracle for GoogleTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        with_retry(&self.retry, || self.translate_once(text, from, to)).await
    }
}

/// The payload is `[[["translated", "source", ...], ...], ...]`; long inputs
/// come back split into several segments.
pub fn parse_translation(payload: &serde_json::Value) -> Result<String, TranslateError> {
    let segments = payload
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::Malformed("missing segment list".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslateError::Malformed("empty translation".to_string()));
    }
    Ok(translated)
}
