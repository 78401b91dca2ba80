//! Retry with exponential backoff for remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use wikicorpus_shared::Result;

/// Exponential backoff: `base * 2^(attempt - 1)` (base, 2×base, 4×base, ...).
pub(crate) fn backoff_duration(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Retry a fallible remote call with exponential backoff.
///
/// Only errors for which [`CorpusError::is_retryable`] holds are retried, up to
/// `max_retries` times. Returns the first success, or the final error.
///
/// [`CorpusError::is_retryable`]: wikicorpus_shared::CorpusError::is_retryable
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    max_retries: u32,
    base: Duration,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match attempt_fn().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                attempt += 1;
                debug!(
                    unit = label,
                    attempt,
                    max_retries,
                    error = %e,
                    "remote call failed, retrying"
                );
                tokio::time::sleep(backoff_duration(base, attempt)).await;
            }
            Err(e) => {
                if e.is_retryable() && max_retries > 0 {
                    warn!(unit = label, error = %e, "giving up after retries");
                }
                return Err(e);
            }
        }
    }
}
