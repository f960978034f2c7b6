use anyhow::Result;
use chatrelay::config::{Config, load_config_with};
use std::path::Path;

/// Load a config file with no environment overrides.
fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_with(path, |_| None)
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_full_file_config_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "telegram": {"token": "123:abc", "allowFrom": ["42"]},
            "provider": {"apiKey": "sk-file", "apiBase": "https://llm.example.com/v1/chat/completions"},
            "generation": {"systemPrompt": "Be brief."}
        }"#,
    );

    let config = load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.telegram.allow_from, vec!["42"]);
    assert_eq!(
        config.provider.api_base.as_deref(),
        Some("https://llm.example.com/v1/chat/completions")
    );
    assert_eq!(config.generation.system_prompt, "Be brief.");
}

#[test]
fn test_out_of_range_temperature_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "telegram": {"token": "123:abc"},
            "provider": {"apiKey": "sk-file"},
            "generation": {"temperature": 7.5}
        }"#,
    );

    let err = load_config(Some(path.as_path())).unwrap_err();
    assert!(format!("{:#}", err).contains("temperature"));
}

#[test]
fn test_bad_api_base_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "telegram": {"token": "123:abc"},
            "provider": {"apiKey": "sk-file", "apiBase": "ftp://nope"}
        }"#,
    );

    assert!(load_config(Some(path.as_path())).is_err());
}

#[test]
fn test_secrets_redacted_in_debug() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{"telegram": {"token": "123:supersecret"}, "provider": {"apiKey": "sk-supersecret"}}"#,
    );

    let config = load_config(Some(path.as_path())).unwrap();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("supersecret"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn test_environment_ignored_by_isolated_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{"telegram": {"token": "123:abc"}, "provider": {"apiKey": "sk-file"}}"#,
    );

    let config = load_config_with(Some(path.as_path()), |name| {
        (name == "TEMPERATURE").then(|| "0.3".to_string())
    })
    .unwrap();
    assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);

    let config = load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.generation.temperature, 1.0);
}
