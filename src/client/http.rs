//! Shared HTTP client, auth headers, and error body extraction.

use std::borrow::Cow;
use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::error::DeckError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Longest slice of a non-JSON error body kept in the message.
const BODY_SNIPPET_LEN: usize = 200;

/// Get (or create) the shared reqwest client.
///
/// No client-wide timeout is set: streaming requests can legitimately run for
/// minutes, so deadlines are applied per call.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            })
    })
}

/// Build default JSON headers, with a Bearer token when one is configured.
pub fn bearer_headers(api_token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = api_token.filter(|t| !t.is_empty()) {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

/// Map a non-2xx response to [`DeckError::Api`].
pub fn status_to_error(status: u16, body: &str) -> DeckError {
    DeckError::api(status, extract_error_message(status, body))
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, FastAPI validation arrays
/// (`{"detail": [{"msg": "..."}]}`), `{"message": "..."}` and
/// `{"error": "..."}` / `{"error": {"message": "..."}}`.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = message_from_json(&value) {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    let snippet: String = trimmed.chars().take(BODY_SNIPPET_LEN).collect();
    format!("HTTP {status}: {snippet}")
}

fn message_from_json(value: &Value) -> Option<String> {
    match value.get("detail") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
        _ => {}
    }

    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(err) => err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        None => None,
    }
}

/// Join a base URL and a relative path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Percent-encode an id for use as a single path segment.
pub fn path_segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}
