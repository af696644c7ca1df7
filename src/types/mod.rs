//! Resource models for the agentdeck backend.

pub mod agent;
pub mod execution;
pub mod metrics;
pub mod team;
pub mod tool;
pub mod validation;
pub mod workflow;

pub use agent::*;
pub use execution::*;
pub use metrics::*;
pub use team::*;
pub use tool::*;
pub use validation::Validate;
pub use workflow::*;
