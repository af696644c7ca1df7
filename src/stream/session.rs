//! Multi-turn chat sessions over the stream controller.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::client::http::{join_url, path_segment};

use super::controller::{StreamController, StreamOutcome};
use super::decoder::FallbackPolicy;
use super::dispatch::StreamObserver;
use super::transport::{StreamRequest, StreamTransport, DEFAULT_STREAM_TIMEOUT};

/// What a chat session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    Agent(String),
    Team(String),
    /// Streams a workflow execution; the message is sent as the workflow input.
    Workflow(String),
}

impl ChatTarget {
    /// Path of the streaming endpoint, relative to the API base URL.
    pub fn stream_path(&self) -> String {
        match self {
            Self::Agent(id) => format!("agents/{}/chat/stream", path_segment(id)),
            Self::Team(id) => format!("teams/{}/chat/stream", path_segment(id)),
            Self::Workflow(id) => format!("workflows/{}/execute/stream", path_segment(id)),
        }
    }

    fn payload(&self, message: &str, session_id: Option<&str>) -> serde_json::Value {
        // plain string fields; serialization cannot fail
        let value = match self {
            Self::Agent(_) | Self::Team(_) => serde_json::to_value(ChatRequest {
                message,
                session_id,
            }),
            Self::Workflow(_) => serde_json::to_value(WorkflowStreamRequest {
                input: message,
                session_id,
            }),
        };
        value.unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WorkflowStreamRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

/// A conversation with one target.
///
/// The session id is carried explicitly: it goes out with every request and
/// is replaced by the one the server returns on completion. `send` takes
/// `&mut self`, so a session never has two streams in flight.
pub struct ChatSession {
    transport: Arc<dyn StreamTransport>,
    base_url: String,
    target: ChatTarget,
    user_id: Option<String>,
    timeout: Duration,
    fallback: FallbackPolicy,
    session_id: Option<String>,
}

impl ChatSession {
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        base_url: impl Into<String>,
        target: ChatTarget,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            target,
            user_id: None,
            timeout: DEFAULT_STREAM_TIMEOUT,
            fallback: FallbackPolicy::default(),
            session_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Resume an existing conversation.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn target(&self) -> &ChatTarget {
        &self.target
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Forget the conversation; the next message starts a new one.
    pub fn reset(&mut self) {
        self.session_id = None;
    }

    /// Build the request for the next turn without sending it.
    pub fn request(&self, message: &str) -> StreamRequest {
        StreamRequest {
            endpoint: join_url(&self.base_url, &self.target.stream_path()),
            payload: self.target.payload(message, self.session_id.as_deref()),
            timeout: self.timeout,
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
        }
    }

    /// Stream one turn. On success the session adopts the returned session id.
    pub async fn send<O>(&mut self, message: &str, observer: &mut O) -> StreamOutcome
    where
        O: StreamObserver + ?Sized,
    {
        let controller = StreamController::new(self.transport.clone(), self.request(message))
            .with_fallback(self.fallback);
        let outcome = controller.run(observer).await;
        if let Some(session_id) = outcome.summary().and_then(|s| s.session_id.clone()) {
            self.session_id = Some(session_id);
        }
        outcome
    }
}
