//! Event classification and callback dispatch.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tokio::time::Instant;

use crate::error::DeckError;

use super::decoder::DecodedEvent;

/// Caller-supplied stream callbacks.
///
/// `on_chunk` may fire any number of times, always before the single
/// terminal callback (`on_complete` or `on_error`).
pub trait StreamObserver: Send {
    fn on_chunk(&mut self, _content: &str) {}
    fn on_complete(&mut self, _summary: &StreamSummary) {}
    fn on_error(&mut self, _error: &DeckError) {}
}

/// Observer that ignores every callback; use the returned outcome instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}

impl<T: StreamObserver + ?Sized> StreamObserver for Box<T> {
    fn on_chunk(&mut self, content: &str) {
        (**self).on_chunk(content)
    }

    fn on_complete(&mut self, summary: &StreamSummary) {
        (**self).on_complete(summary)
    }

    fn on_error(&mut self, error: &DeckError) {
        (**self).on_error(error)
    }
}

/// How a successful stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TerminationMode {
    /// A `done`/`complete` frame was received.
    Explicit,
    /// Input ended without a terminal frame after at least one chunk.
    Implicit,
}

/// Running totals for one stream.
#[derive(Debug, Clone)]
pub struct StreamAccumulator {
    pub total_content: String,
    pub chunk_count: usize,
    /// When the request was issued, on the tokio clock.
    pub started_at: Instant,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            total_content: String::new(),
            chunk_count: 0,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn push(&mut self, content: &str) {
        self.total_content.push_str(content);
        self.chunk_count += 1;
    }
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary handed to `on_complete` and returned in a completed outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    /// The terminal frame's fields (empty for implicit termination).
    pub payload: Map<String, Value>,
    pub total_content: String,
    pub total_chunks: usize,
    pub termination: TerminationMode,
    /// The session this stream belongs to, if any.
    pub session_id: Option<String>,
    /// Time from issuing the request to the terminal event.
    pub elapsed: Duration,
}

impl StreamSummary {
    /// The terminal payload merged with the accumulated totals.
    pub fn to_json(&self) -> Value {
        let mut merged = self.payload.clone();
        merged.insert("total_content".into(), self.total_content.clone().into());
        merged.insert("total_chunks".into(), self.total_chunks.into());
        merged.insert(
            "termination_mode".into(),
            self.termination.to_string().into(),
        );
        merged.insert(
            "elapsed_ms".into(),
            (self.elapsed.as_millis() as u64).into(),
        );
        if let Some(ref session_id) = self.session_id {
            merged.insert("session_id".into(), session_id.clone().into());
        }
        Value::Object(merged)
    }
}

/// Whether the read loop should keep going after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Terminal result recorded by the dispatcher.
#[derive(Debug)]
pub enum Terminal {
    Completed(StreamSummary),
    Failed(DeckError),
}

/// Routes decoded events to a [`StreamObserver`] and enforces that exactly
/// one terminal callback fires.
pub struct Dispatcher<'a, O: StreamObserver + ?Sized> {
    observer: &'a mut O,
    accumulator: StreamAccumulator,
    session_id: Option<String>,
    terminal: Option<Terminal>,
}

impl<'a, O: StreamObserver + ?Sized> Dispatcher<'a, O> {
    pub fn new(observer: &'a mut O, session_id: Option<String>) -> Self {
        Self {
            observer,
            accumulator: StreamAccumulator::new(),
            session_id,
            terminal: None,
        }
    }

    pub fn accumulator(&self) -> &StreamAccumulator {
        &self.accumulator
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn dispatch(&mut self, event: DecodedEvent) -> Flow {
        if self.is_terminated() {
            return Flow::Stop;
        }

        match event {
            DecodedEvent::Text { content } => {
                self.observer.on_chunk(&content);
                self.accumulator.push(&content);
                Flow::Continue
            }
            DecodedEvent::End { payload } => {
                self.complete(payload, TerminationMode::Explicit);
                Flow::Stop
            }
            DecodedEvent::Error { message } => {
                self.fail(DeckError::Protocol(message));
                Flow::Stop
            }
            DecodedEvent::Ignored => Flow::Continue,
        }
    }

    /// Input ended without a terminal frame.
    pub fn finish_end_of_input(&mut self) {
        if self.is_terminated() {
            return;
        }
        if self.accumulator.chunk_count > 0 {
            self.complete(Map::new(), TerminationMode::Implicit);
        } else {
            self.fail(DeckError::NoData);
        }
    }

    /// Terminate with a failure. No-op once a terminal callback has fired.
    pub fn fail(&mut self, error: DeckError) {
        if self.is_terminated() {
            return;
        }
        self.observer.on_error(&error);
        self.terminal = Some(Terminal::Failed(error));
    }

    /// Consume the dispatcher. `None` if the stream never terminated.
    pub fn into_terminal(self) -> Option<Terminal> {
        self.terminal
    }

    fn complete(&mut self, payload: Map<String, Value>, termination: TerminationMode) {
        let session_id = payload
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.session_id.clone());
        let summary = StreamSummary {
            payload,
            total_content: self.accumulator.total_content.clone(),
            total_chunks: self.accumulator.chunk_count,
            termination,
            session_id,
            elapsed: self.accumulator.elapsed(),
        };
        self.observer.on_complete(&summary);
        self.terminal = Some(Terminal::Completed(summary));
    }
}
