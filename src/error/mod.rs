//! Error types for agentdeck.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::workflow::graph::GraphError;

/// Primary error type for all agentdeck operations.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// An `error` frame decoded from the stream.
    #[error("{0}")]
    Protocol(String),

    #[error("Stream aborted")]
    Aborted,

    #[error("No data received from stream")]
    NoData,

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Workflow graph error: {0}")]
    Graph(#[from] GraphError),
}

impl DeckError {
    /// Create an API error from a status and an already-extracted message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error for a request field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) | Self::Io(_) | Self::Stream(_) | Self::Aborted => {
                ErrorCategory::Transport
            }
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Protocol(_) | Self::NoData => ErrorCategory::Protocol,
            Self::Validation { .. } | Self::Graph(_) => ErrorCategory::Validation,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                404 => ErrorCategory::NotFound,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Protocol,
            },
        }
    }

    /// Whether a non-streaming call that failed with this error may be retried.
    ///
    /// Only transport failures and timeouts qualify. Cancellation is a transport
    /// category but is never retried.
    pub fn is_retryable(&self) -> bool {
        if matches!(self, Self::Aborted) {
            return false;
        }
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Timeout
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Transport => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Validation => RecoverySuggestion::FixRequest,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DeckError>;
