use crate::errors::RelayError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Generates a `Debug` impl that redacts secret fields.
///
/// Field specifiers:
/// - `field_name`        : printed normally via `&self.field_name`
/// - `redact(field_name)`: `String` field: shows `[empty]` or `[REDACTED]`
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Telegram
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    /// Sender IDs allowed to talk to the bot. `"*"` admits everyone.
    #[serde(default, rename = "allowFrom")]
    pub allow_from: Vec<String>,
}

redact_debug!(TelegramConfig, redact(token), allow_from,);

// ---------------------------------------------------------------------------
// Completion provider
// ---------------------------------------------------------------------------

fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    /// Full chat-completions URL. `None` targets api.openai.com.
    #[serde(default, rename = "apiBase")]
    pub api_base: Option<String>,
    #[serde(
        default = "default_request_timeout_secs",
        rename = "requestTimeoutSecs"
    )]
    pub request_timeout_secs: u64,
    /// Retries for transient failures. 0 sends exactly one request per message.
    #[serde(default, rename = "maxRetries")]
    pub max_retries: u32,
}

redact_debug!(
    ProviderConfig,
    redact(api_key),
    api_base,
    request_timeout_secs,
    max_retries,
);

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Generation parameters
// ---------------------------------------------------------------------------

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1200
}

fn default_temperature() -> f32 {
    1.0
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, rename = "presencePenalty")]
    pub presence_penalty: f32,
    #[serde(default, rename = "frequencyPenalty")]
    pub frequency_penalty: f32,
    #[serde(default = "default_system_prompt", rename = "systemPrompt")]
    pub system_prompt: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            system_prompt: default_system_prompt(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Config {
    /// Validate configuration values. Missing secrets are reported here so the
    /// process fails before it starts polling.
    pub fn validate(&self) -> Result<(), RelayError> {
        self.validate_secrets()?;
        self.validate_provider()?;
        self.validate_generation()?;
        Ok(())
    }

    fn validate_secrets(&self) -> Result<(), RelayError> {
        if self.telegram.token.trim().is_empty() {
            return Err(RelayError::Config(
                "telegram bot token is missing (set TELEGRAM_BOT_TOKEN or telegram.token)".into(),
            ));
        }
        if self.provider.api_key.trim().is_empty() {
            return Err(RelayError::Config(
                "completion provider API key is missing (set OPENAI_API_KEY or provider.apiKey)"
                    .into(),
            ));
        }
        Ok(())
    }

    fn validate_provider(&self) -> Result<(), RelayError> {
        let p = &self.provider;

        if p.request_timeout_secs == 0 {
            return Err(RelayError::Config(
                "provider.requestTimeoutSecs must be > 0".into(),
            ));
        }
        if p.request_timeout_secs > 600 {
            return Err(RelayError::Config(
                "provider.requestTimeoutSecs is unreasonably large (> 600)".into(),
            ));
        }
        if p.max_retries > 10 {
            return Err(RelayError::Config(
                "provider.maxRetries is unreasonably large (> 10)".into(),
            ));
        }
        if let Some(base) = &p.api_base
            && !(base.starts_with("https://") || base.starts_with("http://"))
        {
            return Err(RelayError::Config(format!(
                "provider.apiBase must be an http(s) URL, got '{}'",
                base
            )));
        }
        if let Some(base) = &p.api_base
            && base.starts_with("http://")
        {
            warn!("provider.apiBase uses plain http, the API key is sent unencrypted");
        }
        Ok(())
    }

    fn validate_generation(&self) -> Result<(), RelayError> {
        let g = &self.generation;

        if g.model.trim().is_empty() {
            return Err(RelayError::Config("generation.model must not be empty".into()));
        }
        if g.max_tokens == 0 {
            return Err(RelayError::Config(
                "generation.maxTokens must be > 0".into(),
            ));
        }
        if g.max_tokens > 1_000_000 {
            return Err(RelayError::Config(
                "generation.maxTokens is unreasonably large (> 1,000,000)".into(),
            ));
        }
        if !g.temperature.is_finite() || !(0.0..=2.0).contains(&g.temperature) {
            return Err(RelayError::Config(
                "generation.temperature must be a finite number between 0.0 and 2.0".into(),
            ));
        }
        for (name, value) in [
            ("presencePenalty", g.presence_penalty),
            ("frequencyPenalty", g.frequency_penalty),
        ] {
            if !value.is_finite() || !(-2.0..=2.0).contains(&value) {
                return Err(RelayError::Config(format!(
                    "generation.{name} must be a finite number between -2.0 and 2.0"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
