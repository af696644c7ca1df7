//! Retry with linear backoff.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Retry policy for non-streaming API calls.
///
/// The delay before attempt `n + 1` is `base_delay * n`; there is no jitter
/// and no circuit breaking. The policy holds no mutable state, so one value
/// can drive any number of concurrent calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay unit; multiplied by the number of the attempt that just failed.
    #[serde(rename = "base_delay_ms", with = "millis")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after `attempt` (1-based) failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Execute an async operation with retry.
    ///
    /// The operation receives the 1-based attempt number. Errors that are not
    /// [`DeckError::is_retryable`] are returned immediately.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, DeckError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, DeckError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt >= self.max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after error"
                    );
                    tokio::time::sleep(delay).await;

                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(DeckError::Timeout(0)))
    }
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
