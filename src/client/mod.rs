//! REST client for the agentdeck backend.
//!
//! Non-streaming calls go through the configured [`RetryPolicy`] with the
//! request timeout applied to each attempt. Streaming calls are handed to the
//! [`stream`](crate::stream) module.
//!
//! [`RetryPolicy`]: crate::util::retry::RetryPolicy

pub mod http;

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DeckConfig;
use crate::error::DeckError;
use crate::stream::{ChatSession, ChatTarget, HttpTransport, StreamController, StreamTransport};
use crate::types::{
    Agent, AgentUpdate, ExecuteWorkflow, Execution, Metrics, NewAgent, NewTeam, NewTool,
    NewWorkflow, Team, TeamUpdate, Tool, ToolUpdate, Validate, Workflow, WorkflowUpdate,
};
use crate::util::timeout::with_timeout;

use self::http::{bearer_headers, join_url, path_segment, shared_client, status_to_error};

/// A backend collection addressable as `{base}/{COLLECTION}[/{id}]`.
pub trait Resource: DeserializeOwned + Send {
    const COLLECTION: &'static str;
}

/// A collection that accepts `POST` and `PUT`.
pub trait Writable: Resource {
    type Create: Serialize + Validate + Sync;
    type Update: Serialize + Validate + Sync;
}

impl Resource for Agent {
    const COLLECTION: &'static str = "agents";
}

impl Writable for Agent {
    type Create = NewAgent;
    type Update = AgentUpdate;
}

impl Resource for Team {
    const COLLECTION: &'static str = "teams";
}

impl Writable for Team {
    type Create = NewTeam;
    type Update = TeamUpdate;
}

impl Resource for Workflow {
    const COLLECTION: &'static str = "workflows";
}

impl Writable for Workflow {
    type Create = NewWorkflow;
    type Update = WorkflowUpdate;
}

impl Resource for Tool {
    const COLLECTION: &'static str = "tools";
}

impl Writable for Tool {
    type Create = NewTool;
    type Update = ToolUpdate;
}

impl Resource for Execution {
    const COLLECTION: &'static str = "executions";
}

/// Client for the agentdeck REST and streaming API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: DeckConfig,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client. The configuration is validated up front.
    pub fn new(config: DeckConfig) -> Result<Self, DeckError> {
        config.validate()?;
        Ok(Self {
            config,
            http: shared_client().clone(),
        })
    }

    /// Client from [`DeckConfig::load`] with no explicit config file.
    pub fn from_env() -> Result<Self, DeckError> {
        Self::new(DeckConfig::load(None)?)
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn agents(&self) -> ResourceApi<'_, Agent> {
        ResourceApi::new(self)
    }

    pub fn teams(&self) -> ResourceApi<'_, Team> {
        ResourceApi::new(self)
    }

    pub fn workflows(&self) -> ResourceApi<'_, Workflow> {
        ResourceApi::new(self)
    }

    pub fn tools(&self) -> ResourceApi<'_, Tool> {
        ResourceApi::new(self)
    }

    pub fn executions(&self) -> ResourceApi<'_, Execution> {
        ResourceApi::new(self)
    }

    /// Dashboard totals from `GET /metrics`.
    pub async fn metrics(&self) -> Result<Metrics, DeckError> {
        self.call_json(Method::GET, "metrics", None).await
    }

    /// Run a workflow to completion without streaming.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        request: &ExecuteWorkflow,
    ) -> Result<Execution, DeckError> {
        let body = serde_json::to_value(request)?;
        if workflow_id.trim().is_empty() {
            return Err(DeckError::validation("workflow_id", "must not be empty"));
        }
        let path = format!("workflows/{}/execute", path_segment(workflow_id));
        self.call_json(Method::POST, &path, Some(&body)).await
    }

    /// Streaming transport carrying this client's credentials.
    pub fn transport(&self) -> Arc<dyn StreamTransport> {
        Arc::new(HttpTransport::new(self.config.api_token.clone()).with_client(self.http.clone()))
    }

    /// A multi-turn session with `target`, using the configured identity and
    /// stream timeout.
    pub fn chat_session(&self, target: ChatTarget) -> ChatSession {
        ChatSession::new(self.transport(), self.config.base_url.clone(), target)
            .with_user_id(self.config.user_id.clone())
            .with_timeout(self.config.stream_timeout)
    }

    /// A ready controller for one message to `target`, starting a new
    /// conversation.
    pub fn stream(&self, target: ChatTarget, message: &str) -> StreamController {
        let request = self.chat_session(target).request(message);
        StreamController::new(self.transport(), request)
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, DeckError> {
        let text = self.call(method, path, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<String, DeckError> {
        let url = join_url(&self.config.base_url, path);
        let url = url.as_str();
        let timeout = self.config.request_timeout;

        self.config
            .retry
            .execute(|attempt| {
                let method = method.clone();
                async move {
                    debug!(%method, url, attempt, "API request");
                    with_timeout(timeout, self.send_once(method, url, body)).await
                }
            })
            .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<String, DeckError> {
        let mut builder = self
            .http
            .request(method, url)
            .headers(bearer_headers(self.config.api_token.as_deref()));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(status_to_error(status.as_u16(), &text));
        }
        Ok(text)
    }
}

/// CRUD operations on one collection.
pub struct ResourceApi<'a, R> {
    client: &'a ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> ResourceApi<'a, R> {
    fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    fn item_path(id: &str) -> Result<String, DeckError> {
        if id.trim().is_empty() {
            return Err(DeckError::validation("id", "must not be empty"));
        }
        Ok(format!("{}/{}", R::COLLECTION, path_segment(id)))
    }

    pub async fn list(&self) -> Result<Vec<R>, DeckError> {
        self.client.call_json(Method::GET, R::COLLECTION, None).await
    }

    pub async fn get(&self, id: &str) -> Result<R, DeckError> {
        let path = Self::item_path(id)?;
        self.client.call_json(Method::GET, &path, None).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DeckError> {
        let path = Self::item_path(id)?;
        self.client.call(Method::DELETE, &path, None).await?;
        Ok(())
    }
}

impl<R: Writable> ResourceApi<'_, R> {
    /// Validate locally, then `POST` the new resource.
    pub async fn create(&self, payload: &R::Create) -> Result<R, DeckError> {
        payload.validate()?;
        let body = serde_json::to_value(payload)?;
        self.client
            .call_json(Method::POST, R::COLLECTION, Some(&body))
            .await
    }

    /// Validate locally, then `PUT` the changes.
    pub async fn update(&self, id: &str, payload: &R::Update) -> Result<R, DeckError> {
        let path = Self::item_path(id)?;
        payload.validate()?;
        let body = serde_json::to_value(payload)?;
        self.client.call_json(Method::PUT, &path, Some(&body)).await
    }
}
