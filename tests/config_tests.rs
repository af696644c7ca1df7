//! Loading configuration from files.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use agentdeck::client::ApiClient;
use agentdeck::config::DeckConfig;
use agentdeck::error::DeckError;

#[test]
fn load_reads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agentdeck.toml");
    std::fs::write(
        &path,
        r#"
base_url = "https://deck.example.com/api"
user_id = "u-42"
request_timeout_ms = 1500

[retry]
max_attempts = 4
base_delay_ms = 250
"#,
    )
    .unwrap();

    let config = DeckConfig::from_file(&path).unwrap();
    assert_eq!(config.base_url, "https://deck.example.com/api");
    assert_eq!(config.user_id.as_deref(), Some("u-42"));
    assert_eq!(config.request_timeout, Duration::from_millis(1500));
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.base_delay, Duration::from_millis(250));

    let client = ApiClient::new(config).unwrap();
    assert_eq!(client.config().retry.max_attempts, 4);
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = DeckConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, DeckError::Io(_)));
}

#[test]
fn config_round_trips_through_toml() {
    let config = DeckConfig::new("http://deck.local")
        .with_api_token("secret")
        .with_stream_timeout(Duration::from_secs(10));
    let raw = toml::to_string(&config).unwrap();
    assert!(raw.contains("stream_timeout_ms = 10000"), "{raw}");
    assert_eq!(DeckConfig::from_toml_str(&raw).unwrap(), config);
}

#[test]
fn zero_retry_attempts_is_rejected() {
    let err = DeckConfig::from_toml_str("[retry]\nmax_attempts = 0\n")
        .unwrap()
        .validate()
        .unwrap_err();
    assert!(matches!(err, DeckError::Configuration(_)));
}
