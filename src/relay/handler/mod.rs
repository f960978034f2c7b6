use crate::bus::{InboundMessage, OutboundMessage};
use crate::config::Config;
use crate::providers::base::{
    CompletionProvider, CompletionRequest, CompletionResponse, FinishReason, GenerationParams,
    RetryConfig,
};
use crate::utils::truncate_for_log;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Sent when the provider call fails for any reason. Error detail stays in the logs.
pub const ERROR_NOTICE: &str =
    "Sorry, something went wrong while generating a reply. Please try again later.";
/// Sent instead of content the provider withheld under its content policy.
pub const REFUSAL_NOTICE: &str = "Sorry, I can't help with that request.";
/// Appended to replies cut off by the output length limit.
pub const TRUNCATION_NOTICE: &str = "[Reply truncated: the response hit the length limit.]";
/// Sent when the provider finished normally but produced no text.
pub const EMPTY_REPLY_NOTICE: &str = "The model returned an empty reply.";

const LOG_PREVIEW_CHARS: usize = 80;

/// Request settings resolved once from configuration at startup.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub model: String,
    pub system_prompt: Option<String>,
    pub params: GenerationParams,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl RelaySettings {
    pub fn from_config(config: &Config) -> Self {
        let generation = &config.generation;
        let system_prompt = Some(generation.system_prompt.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            model: generation.model.clone(),
            system_prompt,
            params: GenerationParams {
                max_tokens: generation.max_tokens,
                temperature: generation.temperature,
                presence_penalty: generation.presence_penalty,
                frequency_penalty: generation.frequency_penalty,
            },
            request_timeout: Duration::from_secs(config.provider.request_timeout_secs),
            retry: RetryConfig {
                max_retries: config.provider.max_retries as usize,
                ..RetryConfig::default()
            },
        }
    }
}

/// Turns one inbound message into at most one reply via the completion provider.
///
/// Holds no per-chat state; concurrent calls are independent.
pub struct RelayHandler {
    provider: Arc<dyn CompletionProvider>,
    settings: RelaySettings,
}

impl RelayHandler {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: RelaySettings) -> Self {
        Self { provider, settings }
    }

    /// Whether the message carries any text worth relaying.
    pub fn is_relayable(message: &InboundMessage) -> bool {
        !message.content.trim().is_empty()
    }

    fn build_request(&self, message: &InboundMessage) -> CompletionRequest {
        CompletionRequest {
            prompt: message.content.trim().to_string(),
            system_prompt: self.settings.system_prompt.clone(),
            model: self.settings.model.clone(),
            params: self.settings.params,
        }
    }

    /// Handle one inbound message. Returns `None` only for empty input;
    /// every other message gets exactly one reply addressed to its chat.
    pub async fn handle(&self, message: InboundMessage) -> Option<OutboundMessage> {
        if !Self::is_relayable(&message) {
            debug!(
                "ignoring empty message from {} in chat {}",
                message.sender_id, message.chat_id
            );
            return None;
        }

        let request = self.build_request(&message);
        debug!(
            "relaying message from {} in chat {}: {}",
            message.sender_id,
            message.chat_id,
            truncate_for_log(&request.prompt, LOG_PREVIEW_CHARS)
        );

        let started = Instant::now();
        let result = self
            .provider
            .complete_with_retry(&request, &self.settings.retry, self.settings.request_timeout)
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        let text = match result {
            Ok(response) => {
                debug!(
                    "{} replied in {}ms (finish_reason={:?}, {} chars)",
                    self.provider.name(),
                    elapsed_ms,
                    response.finish_reason,
                    response.text.chars().count()
                );
                self.render(response, &message)
            }
            Err(e) => {
                error!(
                    "completion for chat {} failed after {}ms via {}: {}",
                    message.chat_id,
                    elapsed_ms,
                    self.provider.name(),
                    e
                );
                ERROR_NOTICE.to_string()
            }
        };

        Some(message.reply(text))
    }

    fn render(&self, response: CompletionResponse, message: &InboundMessage) -> String {
        match response.finish_reason {
            FinishReason::Completed if response.text.is_empty() => {
                warn!("{} returned an empty completion", self.provider.name());
                EMPTY_REPLY_NOTICE.to_string()
            }
            FinishReason::Completed => response.text,
            FinishReason::Truncated if response.text.is_empty() => TRUNCATION_NOTICE.to_string(),
            FinishReason::Truncated => format!("{}\n\n{}", response.text, TRUNCATION_NOTICE),
            FinishReason::Filtered => {
                warn!(
                    "{} filtered the reply for chat {}",
                    self.provider.name(),
                    message.chat_id
                );
                REFUSAL_NOTICE.to_string()
            }
            FinishReason::Error => {
                error!(
                    "{} reported finish_reason=error for chat {}",
                    self.provider.name(),
                    message.chat_id
                );
                ERROR_NOTICE.to_string()
            }
        }
    }
}
