//! Convenience re-exports for common use.

pub use crate::client::{ApiClient, Resource, ResourceApi, Writable};
pub use crate::config::DeckConfig;
pub use crate::error::{DeckError, Result};
pub use crate::stream::{
    ChatSession, ChatTarget, StreamController, StreamObserver, StreamOutcome, StreamRequest,
    StreamSummary,
};
pub use crate::types::Validate;
pub use crate::util::retry::RetryPolicy;
pub use crate::workflow::{NodeId, NodeKind, WorkflowGraph};
