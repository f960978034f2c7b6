use super::*;

fn valid_config() -> Config {
    let mut config = Config::default();
    config.telegram.token = "123:abc".into();
    config.provider.api_key = "sk-test".into();
    config
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.generation.model, "gpt-3.5-turbo");
    assert_eq!(config.generation.max_tokens, 1200);
    assert!((config.generation.temperature - 1.0).abs() < f32::EPSILON);
    assert_eq!(config.generation.system_prompt, "You are a helpful assistant.");
    assert_eq!(config.provider.request_timeout_secs, 120);
    assert_eq!(config.provider.max_retries, 0);
    assert!(config.provider.api_base.is_none());
    assert!(config.telegram.allow_from.is_empty());
}

#[test]
fn test_valid_config_passes() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_missing_telegram_token_rejected() {
    let mut config = valid_config();
    config.telegram.token = "  ".into();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn test_missing_api_key_rejected() {
    let mut config = valid_config();
    config.provider.api_key = String::new();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, RelayError::Config(_)));
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn test_zero_timeout_rejected() {
    let mut config = valid_config();
    config.provider.request_timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_huge_timeout_rejected() {
    let mut config = valid_config();
    config.provider.request_timeout_secs = 3600;
    assert!(config.validate().is_err());
}

#[test]
fn test_too_many_retries_rejected() {
    let mut config = valid_config();
    config.provider.max_retries = 50;
    assert!(config.validate().is_err());
}

#[test]
fn test_api_base_must_be_url() {
    let mut config = valid_config();
    config.provider.api_base = Some("localhost:8080".into());
    assert!(config.validate().is_err());

    config.provider.api_base = Some("http://localhost:8080/v1/chat/completions".into());
    assert!(config.validate().is_ok());
}

#[test]
fn test_temperature_bounds() {
    let mut config = valid_config();
    config.generation.temperature = 2.5;
    assert!(config.validate().is_err());
    config.generation.temperature = f32::NAN;
    assert!(config.validate().is_err());
    config.generation.temperature = 0.0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_penalty_bounds() {
    let mut config = valid_config();
    config.generation.frequency_penalty = -3.0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("frequencyPenalty"));
}

#[test]
fn test_zero_max_tokens_rejected() {
    let mut config = valid_config();
    config.generation.max_tokens = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_model_rejected() {
    let mut config = valid_config();
    config.generation.model = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_debug_redacts_secrets() {
    let config = valid_config();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("123:abc"));
    assert!(!debug.contains("sk-test"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn test_debug_shows_empty_marker() {
    let debug = format!("{:?}", TelegramConfig::default());
    assert!(debug.contains("[empty]"));
}

#[test]
fn test_deserialize_camel_case_keys() {
    let config: Config = serde_json::from_value(serde_json::json!({
        "telegram": {"token": "t", "allowFrom": ["42"]},
        "provider": {"apiKey": "k", "requestTimeoutSecs": 30, "maxRetries": 2},
        "generation": {"model": "gpt-4", "maxTokens": 256, "systemPrompt": "Be brief."}
    }))
    .unwrap();
    assert_eq!(config.telegram.allow_from, vec!["42"]);
    assert_eq!(config.provider.request_timeout_secs, 30);
    assert_eq!(config.provider.max_retries, 2);
    assert_eq!(config.generation.model, "gpt-4");
    assert_eq!(config.generation.max_tokens, 256);
    assert_eq!(config.generation.system_prompt, "Be brief.");
    // Unspecified fields keep their defaults
    assert!((config.generation.temperature - 1.0).abs() < f32::EPSILON);
}
