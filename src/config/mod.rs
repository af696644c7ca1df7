//! Configuration system (layered: defaults < config file < env).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::stream::transport::DEFAULT_STREAM_TIMEOUT;
use crate::util::retry::{millis, RetryPolicy};

/// Global default config (lazy-initialized by [`DeckConfig::load`]).
static DEFAULT_CONFIG: OnceLock<DeckConfig> = OnceLock::new();

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "AGENTDECK_API_URL";
pub const ENV_API_TOKEN: &str = "AGENTDECK_API_TOKEN";
pub const ENV_USER_ID: &str = "AGENTDECK_USER_ID";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "AGENTDECK_REQUEST_TIMEOUT_MS";
pub const ENV_STREAM_TIMEOUT_MS: &str = "AGENTDECK_STREAM_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "AGENTDECK_MAX_RETRIES";

/// Client configuration.
///
/// ```toml
/// base_url = "https://deck.example.com/api"
/// api_token = "..."
/// user_id = "u-42"
/// request_timeout_ms = 30000
/// stream_timeout_ms = 120000
///
/// [retry]
/// max_attempts = 3
/// base_delay_ms = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Deadline for each non-streaming attempt.
    #[serde(rename = "request_timeout_ms", with = "millis")]
    pub request_timeout: Duration,
    /// Overall deadline for a streaming request.
    #[serde(rename = "stream_timeout_ms", with = "millis")]
    pub stream_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            user_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl DeckConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, DeckError> {
        toml::from_str(raw)
            .map_err(|e| DeckError::Configuration(format!("invalid config file: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, DeckError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Platform config file location, e.g. `~/.config/agentdeck/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "agentdeck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment (and `.env`, if present).
    pub fn apply_env(self) -> Result<Self, DeckError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, DeckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            self.user_id = Some(user_id);
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_MS) {
            self.request_timeout = Duration::from_millis(parse_number(ENV_REQUEST_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = get(ENV_STREAM_TIMEOUT_MS) {
            self.stream_timeout = Duration::from_millis(parse_number(ENV_STREAM_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = get(ENV_MAX_RETRIES) {
            self.retry.max_attempts = parse_number(ENV_MAX_RETRIES, &raw)?;
        }
        Ok(self)
    }

    /// Load from env only (no config file).
    pub fn from_env() -> Result<Self, DeckError> {
        let config = Self::default().apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the config file at `path` (or [`Self::default_path`]
    /// when it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, DeckError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Loading config file");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        let config = base.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Get (or load) the global default config, falling back to defaults when
    /// the environment is invalid.
    pub fn global() -> &'static DeckConfig {
        DEFAULT_CONFIG.get_or_init(|| {
            Self::load(None).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring invalid configuration");
                Self::default()
            })
        })
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(DeckError::Configuration("base_url is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DeckError::Configuration(format!(
                "base_url must start with http:// or https://, got {url}"
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(DeckError::Configuration(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.stream_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(DeckError::Configuration("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, DeckError> {
    raw.trim()
        .parse()
        .map_err(|_| DeckError::Configuration(format!("{key} must be a number, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = DeckConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.stream_timeout, Duration::from_secs(120));
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = DeckConfig::from_toml_str(
            r#"
            base_url = "https://deck.example.com"
            stream_timeout_ms = 5000

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://deck.example.com");
        assert_eq!(config.stream_timeout, Duration::from_millis(5000));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"http://file.local\"\nuser_id = \"file-user\"\n").unwrap();

        let config = DeckConfig::from_file(&path)
            .unwrap()
            .apply_env_from(env(&[
                (ENV_API_URL, "http://env.local"),
                (ENV_API_TOKEN, "tok"),
                (ENV_MAX_RETRIES, "2"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "http://env.local");
        assert_eq!(config.user_id.as_deref(), Some("file-user"));
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.retry.max_attempts, 2);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = DeckConfig::default()
            .apply_env_from(env(&[(ENV_API_URL, "  ")]))
            .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let err = DeckConfig::default()
            .apply_env_from(env(&[(ENV_STREAM_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, DeckError::Configuration(_)));
        assert!(err.to_string().contains(ENV_STREAM_TIMEOUT_MS));
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        assert!(DeckConfig::new("").validate().is_err());
        assert!(DeckConfig::new("ftp://deck").validate().is_err());
        assert!(DeckConfig::new("https://deck").validate().is_ok());
    }

    #[test]
    fn malformed_file_is_configuration_error() {
        let err = DeckConfig::from_toml_str("base_url = [").unwrap_err();
        assert!(matches!(err, DeckError::Configuration(_)));
    }
}
