use crate::errors::{RelayError, RelayResult};
use crate::providers::base::{
    CompletionProvider, CompletionRequest, CompletionResponse, FinishReason,
};
use crate::providers::errors::ProviderErrorHandler;
use crate::providers::provider_http_client;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

pub const API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAIProvider {
    api_key: String,
    base_url: String,
    provider_name: String,
    timeout: Duration,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| API_URL.to_string()),
            provider_name: "OpenAI".to_string(),
            timeout,
            client: provider_http_client(timeout),
        }
    }

    fn build_payload(req: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = req.system_prompt.as_deref().filter(|s| !s.trim().is_empty()) {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": req.prompt}));

        json!({
            "model": req.model,
            "messages": messages,
            "max_tokens": req.params.max_tokens,
            "temperature": req.params.temperature,
            "presence_penalty": req.params.presence_penalty,
            "frequency_penalty": req.params.frequency_penalty,
            "n": 1,
        })
    }
}

/// Map a chat-completions `finish_reason` into the closed `FinishReason` set.
///
/// A missing or null reason is treated as a normal stop; some compatible
/// servers omit it on non-streaming responses.
pub fn map_finish_reason(raw: Option<&str>) -> RelayResult<FinishReason> {
    match raw {
        None | Some("stop" | "tool_calls" | "function_call") => Ok(FinishReason::Completed),
        Some("length") => Ok(FinishReason::Truncated),
        Some("content_filter") => Ok(FinishReason::Filtered),
        Some("error") => Ok(FinishReason::Error),
        Some(other) => Err(RelayError::Parse(format!(
            "unrecognized finish_reason '{}'",
            other
        ))),
    }
}

/// Parse a chat-completions response body.
pub fn parse_completion(json: &Value) -> RelayResult<CompletionResponse> {
    let choice = json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .ok_or_else(|| RelayError::Parse("no choices in response".into()))?;

    let finish_reason = match choice.get("finish_reason") {
        None | Some(Value::Null) => map_finish_reason(None)?,
        Some(Value::String(s)) => map_finish_reason(Some(s.as_str()))?,
        Some(other) => {
            return Err(RelayError::Parse(format!(
                "finish_reason is not a string: {}",
                other
            )));
        }
    };

    let message = choice
        .get("message")
        .ok_or_else(|| RelayError::Parse("choice has no message".into()))?;

    let refused = message
        .get("refusal")
        .and_then(Value::as_str)
        .is_some_and(|r| !r.trim().is_empty());
    if refused || finish_reason == FinishReason::Filtered {
        return Ok(CompletionResponse {
            text: String::new(),
            finish_reason: FinishReason::Filtered,
        });
    }

    let text = match message.get("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => {
            return Err(RelayError::Parse(format!(
                "message content is not a string: {}",
                other
            )));
        }
    };

    Ok(CompletionResponse {
        text,
        finish_reason,
    })
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, req: &CompletionRequest) -> RelayResult<CompletionResponse> {
        let payload = Self::build_payload(req);
        let timeout_secs = self.timeout.as_secs();

        let resp = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                ProviderErrorHandler::from_transport(&e, &self.provider_name, timeout_secs)
            })?;

        let json =
            ProviderErrorHandler::check_response(resp, &self.provider_name, timeout_secs).await?;

        if let Some(tokens) = json
            .get("usage")
            .and_then(|u| u.get("total_tokens"))
            .and_then(Value::as_u64)
        {
            debug!("{} request used {} tokens", self.provider_name, tokens);
        }

        parse_completion(&json)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}
