//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::DeckError;

/// Wrap a future with a timeout, mapping expiry to [`DeckError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, DeckError>>,
) -> Result<T, DeckError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(DeckError::Timeout(duration.as_millis() as u64)),
    }
}
