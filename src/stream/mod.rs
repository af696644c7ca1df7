//! Streaming chat protocol client.
//!
//! A response body is split into lines ([`LineBuffer`]), each line is decoded
//! into a [`DecodedEvent`] ([`EventDecoder`]), and decoded events are routed to
//! caller callbacks ([`Dispatcher`], [`StreamObserver`]). The
//! [`StreamController`] owns the request, the deadline, and cancellation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentdeck::stream::{HttpTransport, StreamController, StreamObserver, StreamRequest};
//!
//! struct Print;
//!
//! impl StreamObserver for Print {
//!     fn on_chunk(&mut self, content: &str) {
//!         print!("{content}");
//!     }
//! }
//!
//! # async fn example() {
//! let request = StreamRequest::builder()
//!     .endpoint("http://localhost:8000/agents/a-1/chat/stream")
//!     .payload(serde_json::json!({ "message": "Hello" }))
//!     .build();
//! let controller = StreamController::new(Arc::new(HttpTransport::new(None)), request);
//! let outcome = controller.run(&mut Print).await;
//! println!("\n{outcome:?}");
//! # }
//! ```

pub mod buffer;
pub mod controller;
pub mod decoder;
pub mod dispatch;
pub mod session;
pub mod transport;

pub use buffer::LineBuffer;
pub use controller::{
    FailureReason, StreamController, StreamHandle, StreamItem, StreamOutcome, StreamState,
};
pub use decoder::{DecodedEvent, EventDecoder, EventKind, FallbackPolicy};
pub use dispatch::{
    Dispatcher, Flow, NoopObserver, StreamAccumulator, StreamObserver, StreamSummary,
    TerminationMode,
};
pub use session::{ChatSession, ChatTarget};
pub use transport::{ByteStream, HttpTransport, StreamRequest, StreamTransport};
