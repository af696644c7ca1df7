//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network, DNS, IO, or cancellation failure.
    Transport,
    /// A decoded `error` frame or an unexpected non-2xx response.
    Protocol,
    Timeout,
    Validation,
    Server,
    Authentication,
    NotFound,
    Configuration,
    Serialization,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    FixRequest,
    ContactSupport,
}
