//! Stream controller: owns one streaming request from issue to outcome.
//!
//! The controller races every suspension point (opening the transport and each
//! body read) against an overall deadline and an abort signal. Whichever
//! resolves first decides the next transition:
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Completed (explicit | implicit)
//!              \              \----> Failed
//!               \------------------> Failed
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use strum::Display;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::debug;

use crate::error::DeckError;

use super::buffer::LineBuffer;
use super::decoder::{EventDecoder, FallbackPolicy};
use super::dispatch::{Dispatcher, Flow, StreamObserver, StreamSummary, Terminal};
use super::transport::{StreamRequest, StreamTransport};

/// Lifecycle state of a [`StreamController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StreamState {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Failed,
}

/// Why a stream failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The initial response was not 2xx.
    Http { status: u16, message: String },
    Transport(String),
    /// The server sent an `error` frame.
    Protocol(String),
    Timeout { after_ms: u64 },
    Aborted,
    NoData,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Protocol(message) => f.write_str(message),
            Self::Timeout { after_ms } => write!(f, "timeout after {after_ms}ms"),
            Self::Aborted => f.write_str("aborted"),
            Self::NoData => f.write_str("no data received"),
        }
    }
}

impl From<&DeckError> for FailureReason {
    fn from(error: &DeckError) -> Self {
        match error {
            DeckError::Api { status, message } => Self::Http {
                status: *status,
                message: message.clone(),
            },
            DeckError::Protocol(message) => Self::Protocol(message.clone()),
            DeckError::Serialization(e) => Self::Protocol(e.to_string()),
            DeckError::Timeout(ms) => Self::Timeout { after_ms: *ms },
            DeckError::Aborted => Self::Aborted,
            DeckError::NoData => Self::NoData,
            DeckError::Stream(message) => Self::Transport(message.clone()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Result of one stream. Produced exactly once, at termination.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed(StreamSummary),
    Failed { reason: FailureReason },
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn summary(&self) -> Option<&StreamSummary> {
        match self {
            Self::Completed(summary) => Some(summary),
            Self::Failed { .. } => None,
        }
    }

    /// Convert into a `Result`, turning failures back into [`DeckError`].
    pub fn into_result(self) -> Result<StreamSummary, DeckError> {
        match self {
            Self::Completed(summary) => Ok(summary),
            Self::Failed { reason } => Err(match reason {
                FailureReason::Http { status, message } => DeckError::api(status, message),
                FailureReason::Transport(message) => DeckError::Stream(message),
                FailureReason::Protocol(message) => DeckError::Protocol(message),
                FailureReason::Timeout { after_ms } => DeckError::Timeout(after_ms),
                FailureReason::Aborted => DeckError::Aborted,
                FailureReason::NoData => DeckError::NoData,
            }),
        }
    }
}

/// Drives a single [`StreamRequest`] to a [`StreamOutcome`].
///
/// `run` consumes the controller, so an instance can never process two
/// streams. Independent controllers share nothing and may run concurrently.
pub struct StreamController {
    transport: Arc<dyn StreamTransport>,
    request: StreamRequest,
    decoder: EventDecoder,
    state: StreamState,
}

impl fmt::Debug for StreamController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamController")
            .field("request", &self.request)
            .field("decoder", &self.decoder)
            .field("state", &self.state)
            .finish()
    }
}

impl StreamController {
    pub fn new(transport: Arc<dyn StreamTransport>, request: StreamRequest) -> Self {
        Self {
            transport,
            request,
            decoder: EventDecoder::default(),
            state: StreamState::Idle,
        }
    }

    /// Choose how malformed `data:` payloads are treated.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.decoder = EventDecoder::new(fallback);
        self
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Run to completion with no external cancellation.
    pub async fn run<O>(self, observer: &mut O) -> StreamOutcome
    where
        O: StreamObserver + ?Sized,
    {
        self.run_until(observer, std::future::pending::<()>()).await
    }

    /// Run until the stream terminates or `abort` resolves.
    ///
    /// Abort is observed only at suspension points, never inside a callback.
    /// It is reported through `on_error` as [`DeckError::Aborted`].
    pub async fn run_until<O, A>(mut self, observer: &mut O, abort: A) -> StreamOutcome
    where
        O: StreamObserver + ?Sized,
        A: Future<Output = ()>,
    {
        let timeout = self.request.timeout;
        let timeout_ms = timeout.as_millis() as u64;
        let deadline = time::sleep_until(Instant::now() + timeout);
        tokio::pin!(deadline);
        tokio::pin!(abort);

        let mut dispatcher = Dispatcher::new(observer, self.request.session_id.clone());

        self.transition(StreamState::Connecting);
        let opened = tokio::select! {
            biased;
            _ = &mut abort => Err(DeckError::Aborted),
            _ = &mut deadline => Err(DeckError::Timeout(timeout_ms)),
            result = self.transport.open(&self.request) => result,
        };
        let mut body = match opened {
            Ok(body) => body,
            Err(err) => {
                dispatcher.fail(err);
                return self.finish(dispatcher);
            }
        };

        self.transition(StreamState::Streaming);
        let mut lines = LineBuffer::new();
        'read: loop {
            let next = tokio::select! {
                biased;
                _ = &mut abort => Err(DeckError::Aborted),
                _ = &mut deadline => Err(DeckError::Timeout(timeout_ms)),
                chunk = body.next() => Ok(chunk),
            };

            match next {
                Ok(Some(Ok(bytes))) => {
                    for line in lines.feed_bytes(&bytes) {
                        if dispatcher.dispatch(self.decoder.decode(&line)) == Flow::Stop {
                            break 'read;
                        }
                    }
                }
                Ok(None) => {
                    let remainder = lines.flush_remainder();
                    if !remainder.is_empty() {
                        dispatcher.dispatch(self.decoder.decode(&remainder));
                    }
                    dispatcher.finish_end_of_input();
                    break;
                }
                Ok(Some(Err(err))) | Err(err) => {
                    dispatcher.fail(err);
                    break;
                }
            }
        }
        // release the connection before reporting
        drop(body);

        self.finish(dispatcher)
    }

    /// Run on a tokio task. The returned handle can abort the stream.
    ///
    /// Dropping the handle detaches the stream; it keeps running and the
    /// observer still receives its terminal callback.
    pub fn spawn<O>(self, mut observer: O) -> StreamHandle
    where
        O: StreamObserver + 'static,
    {
        let (abort_tx, abort_rx) = oneshot::channel::<()>();
        let abort = async move {
            if abort_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let task = tokio::spawn(async move { self.run_until(&mut observer, abort).await });
        StreamHandle {
            abort_tx: Some(abort_tx),
            task,
        }
    }

    /// Run in the background and expose the chunks as a stream, followed by
    /// a single [`StreamItem::Finished`]. Dropping the stream aborts the
    /// request.
    pub fn into_stream(self) -> BoxStream<'static, StreamItem> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut guard = AbortOnDrop(Some(self.spawn(ChunkForwarder { tx })));

        let stream = async_stream::stream! {
            // the forwarder is dropped with the task, which closes the channel
            while let Some(content) = rx.recv().await {
                yield StreamItem::Chunk(content);
            }
            if let Some(handle) = guard.0.take() {
                yield StreamItem::Finished(handle.wait().await);
            }
        };
        Box::pin(stream)
    }

    fn transition(&mut self, next: StreamState) {
        debug!(
            endpoint = %self.request.endpoint,
            from = %self.state,
            to = %next,
            "Stream state transition"
        );
        self.state = next;
    }

    fn finish<O: StreamObserver + ?Sized>(mut self, dispatcher: Dispatcher<'_, O>) -> StreamOutcome {
        let chunks = dispatcher.accumulator().chunk_count;
        let elapsed_ms = dispatcher.accumulator().elapsed().as_millis() as u64;

        let outcome = match dispatcher.into_terminal() {
            Some(Terminal::Completed(summary)) => StreamOutcome::Completed(summary),
            Some(Terminal::Failed(err)) => StreamOutcome::Failed {
                reason: FailureReason::from(&err),
            },
            None => StreamOutcome::Failed {
                reason: FailureReason::Transport("stream ended without a terminal event".into()),
            },
        };

        match &outcome {
            StreamOutcome::Completed(summary) => {
                self.transition(StreamState::Completed);
                debug!(
                    chunks,
                    elapsed_ms,
                    termination = %summary.termination,
                    "Stream completed"
                );
            }
            StreamOutcome::Failed { reason } => {
                self.transition(StreamState::Failed);
                tracing::warn!(chunks, elapsed_ms, reason = %reason, "Stream failed");
            }
        }
        outcome
    }
}

/// Handle to a spawned stream.
#[derive(Debug)]
pub struct StreamHandle {
    abort_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    /// Request cancellation. Returns `false` if already requested or the
    /// stream has finished.
    pub fn abort(&mut self) -> bool {
        if let Some(tx) = self.abort_tx.take() {
            return tx.send(()).is_ok();
        }
        false
    }

    /// Wait for the outcome. A task that panicked or was cancelled by the
    /// runtime is reported as aborted.
    pub async fn wait(self) -> StreamOutcome {
        let Self { abort_tx, task } = self;
        let outcome = task.await.unwrap_or(StreamOutcome::Failed {
            reason: FailureReason::Aborted,
        });
        drop(abort_tx);
        outcome
    }
}

/// Item of [`StreamController::into_stream`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Chunk(String),
    Finished(StreamOutcome),
}

struct ChunkForwarder {
    tx: mpsc::UnboundedSender<String>,
}

impl StreamObserver for ChunkForwarder {
    fn on_chunk(&mut self, content: &str) {
        let _ = self.tx.send(content.to_string());
    }
}

struct AbortOnDrop(Option<StreamHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.as_mut() {
            handle.abort();
        }
    }
}
