//! Transport seam between the stream controller and HTTP.

use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT};
use tracing::debug;

use crate::client::http::{bearer_headers, shared_client, status_to_error};
use crate::error::DeckError;

/// Default overall deadline for a streaming request.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Raw response body as a sequence of byte chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, DeckError>>;

/// One streaming request. Immutable once built.
///
/// ```
/// use agentdeck::stream::StreamRequest;
///
/// let request = StreamRequest::builder()
///     .endpoint("http://localhost:8000/agents/a-1/chat/stream")
///     .payload(serde_json::json!({ "message": "Hi" }))
///     .session_id("s-1".to_string())
///     .build();
/// assert_eq!(request.session_id.as_deref(), Some("s-1"));
/// ```
#[derive(Debug, Clone, Builder)]
pub struct StreamRequest {
    #[builder(into)]
    pub endpoint: String,
    pub payload: serde_json::Value,
    #[builder(default = DEFAULT_STREAM_TIMEOUT)]
    pub timeout: Duration,
    /// Conversation to continue; echoed back in the stream summary.
    pub session_id: Option<String>,
    /// Caller identity, sent as the `user_id` query parameter.
    pub user_id: Option<String>,
}

/// Opens the response body for a [`StreamRequest`].
///
/// Implementations return `Err` for connection failures and non-2xx
/// responses; the body stream reports mid-stream transport errors.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, DeckError>;
}

/// [`StreamTransport`] over the shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_token: Option<String>,
}

impl HttpTransport {
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            client: shared_client().clone(),
            api_token,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, DeckError> {
        debug!(endpoint = %request.endpoint, "Opening stream");

        let mut headers = bearer_headers(self.api_token.as_deref());
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let mut builder = self
            .client
            .post(&request.endpoint)
            .headers(headers)
            .json(&request.payload);
        if let Some(ref user_id) = request.user_id {
            builder = builder.query(&[("user_id", user_id)]);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }

        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(DeckError::from));
        Ok(Box::pin(body))
    }
}
