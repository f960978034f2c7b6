use crate::errors::{RelayError, RelayResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Generation options sent with every request. Sourced from process
/// configuration, never from the message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: String,
    pub params: GenerationParams,
}

/// Why generation stopped, normalised across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Completed,
    Truncated,
    Filtered,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
    pub finish_reason: FinishReason,
}

impl CompletionResponse {
    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: FinishReason::Completed,
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_delay_ms`.
    pub fn delay_for(&self, attempt: usize, retry_after: Option<u64>) -> Duration {
        let backoff = (self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32))
            .min(self.max_delay_ms as f64) as u64;
        let hinted = retry_after.map_or(0, |s| s.saturating_mul(1000));
        Duration::from_millis(backoff.max(hinted).min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> RelayResult<CompletionResponse>;

    fn name(&self) -> &str;

    /// Complete with each attempt bounded by `attempt_timeout`, retrying only
    /// transient failures. Auth, quota and parse errors return immediately.
    async fn complete_with_retry(
        &self,
        req: &CompletionRequest,
        retry_config: &RetryConfig,
        attempt_timeout: Duration,
    ) -> RelayResult<CompletionResponse> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(attempt_timeout, self.complete(req)).await {
                Ok(result) => result,
                Err(_) => Err(RelayError::Timeout(attempt_timeout.as_secs())),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < retry_config.max_retries => {
                    let retry_after = match &e {
                        RelayError::RateLimit { retry_after } => *retry_after,
                        _ => None,
                    };
                    let delay = retry_config.delay_for(attempt, retry_after);
                    warn!(
                        "{} request failed (attempt {}/{}): {}, retrying in {}ms",
                        self.name(),
                        attempt + 1,
                        retry_config.max_retries + 1,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(
                        "{} request failed after {} attempt(s)",
                        self.name(),
                        attempt + 1
                    );
                    return Err(e);
                }
            }
        }
    }
}
