//! Shared test helpers: scripted transport and recording observer.

#![allow(dead_code)]

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use agentdeck::error::DeckError;
use agentdeck::stream::{ByteStream, StreamObserver, StreamRequest, StreamSummary, StreamTransport};

/// Every observer callback, in the order it fired.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Chunk(String),
    Complete(StreamSummary),
    Error(String),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
}

impl Recorder {
    pub fn chunks(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Chunk(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<&StreamSummary> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Complete(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Error(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal callbacks (complete or error).
    pub fn terminals(&self) -> usize {
        self.completions().len() + self.errors().len()
    }
}

impl StreamObserver for Recorder {
    fn on_chunk(&mut self, content: &str) {
        self.calls.push(Call::Chunk(content.to_string()));
    }

    fn on_complete(&mut self, summary: &StreamSummary) {
        self.calls.push(Call::Complete(summary.clone()));
    }

    fn on_error(&mut self, error: &DeckError) {
        self.calls.push(Call::Error(error.to_string()));
    }
}

/// Replays the same body on every `open` and records the requests it saw.
///
/// Each body it hands out is counted until dropped, so tests can check that
/// the controller released the connection.
#[derive(Default)]
pub struct ScriptedTransport {
    chunks: Vec<Vec<u8>>,
    fail_after: Option<String>,
    reject: Option<(u16, String)>,
    hold_open: bool,
    live_bodies: Arc<AtomicUsize>,
    pub requests: Mutex<Vec<StreamRequest>>,
}

impl ScriptedTransport {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            ..Self::default()
        }
    }

    /// Fail `open` with a non-success status.
    pub fn rejecting(status: u16, message: &str) -> Self {
        Self {
            reject: Some((status, message.to_string())),
            ..Self::default()
        }
    }

    /// Keep the body open after the scripted chunks.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// End the body with a transport error instead of a clean EOF.
    pub fn fail_after(mut self, message: &str) -> Self {
        self.fail_after = Some(message.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Bodies handed out and not yet dropped.
    pub fn live_bodies(&self) -> usize {
        self.live_bodies.load(Ordering::SeqCst)
    }

    /// Shared view of [`Self::live_bodies`] for transports moved into a task.
    pub fn live_body_counter(&self) -> Arc<AtomicUsize> {
        self.live_bodies.clone()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, DeckError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some((status, ref message)) = self.reject {
            return Err(DeckError::api(status, message.clone()));
        }

        let mut items: Vec<Result<Vec<u8>, DeckError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        if let Some(ref message) = self.fail_after {
            items.push(Err(DeckError::Stream(message.clone())));
        }
        let body = futures::stream::iter(items);
        let body = if self.hold_open {
            body.chain(futures::stream::pending()).boxed()
        } else {
            body.boxed()
        };
        Ok(TrackedBody::new(body, self.live_bodies.clone()).boxed())
    }
}

/// Body stream that decrements a shared counter when dropped.
struct TrackedBody {
    inner: ByteStream,
    live: Arc<AtomicUsize>,
}

impl TrackedBody {
    fn new(inner: ByteStream, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { inner, live }
    }
}

impl Stream for TrackedBody {
    type Item = Result<Vec<u8>, DeckError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transport whose `open` never resolves.
pub struct StalledTransport;

#[async_trait]
impl StreamTransport for StalledTransport {
    async fn open(&self, _request: &StreamRequest) -> Result<ByteStream, DeckError> {
        futures::future::pending().await
    }
}
