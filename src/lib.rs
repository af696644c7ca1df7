//! agentdeck: client for an agent orchestration backend.
//!
//! The core is a streaming chat protocol client ([`stream`]): it POSTs a chat
//! request, reads the newline-delimited `data:` frames of the response, and
//! reports content chunks, completion, and errors to a caller-supplied
//! [`StreamObserver`](stream::StreamObserver). Around it sit a REST client
//! for agents, teams, workflows, tools and executions ([`client`]), a
//! workflow graph model ([`workflow`]), and layered configuration
//! ([`config`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use agentdeck::prelude::*;
//!
//! struct Print;
//!
//! impl StreamObserver for Print {
//!     fn on_chunk(&mut self, content: &str) {
//!         print!("{content}");
//!     }
//! }
//!
//! # async fn example() -> agentdeck::error::Result<()> {
//! let client = ApiClient::new(DeckConfig::load(None)?)?;
//! let mut session = client.chat_session(ChatTarget::Agent("a-1".into()));
//! let summary = session.send("Hello!", &mut Print).await.into_result()?;
//! println!("\n{} chunks", summary.total_chunks);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod prelude;
pub mod stream;
pub mod types;
pub mod util;
pub mod workflow;

#[cfg(feature = "cli")]
pub mod cli;
