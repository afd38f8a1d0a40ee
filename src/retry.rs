//! Bounded exponential backoff for provider I/O.
//!
//! Grounded on `src/llm/rate_limiter.rs`'s wait loop: compute a delay,
//! `tracing::debug!` it, `tokio::time::sleep`, try again. Unlike the rate
//! limiter (which waits for a shared window to clear), this retries a single
//! fallible operation a bounded number of times and gives up on the first
//! non-retryable error.

use std::future::Future;
use std::time::Duration;

use crate::errors::OrchestratorError;

/// Retry `op` up to `max_attempts` times (the first call counts as attempt
/// one), doubling the delay each time starting from the error's own
/// suggested [`OrchestratorError::retry_delay_ms`]. Stops immediately if an
/// attempt returns an error `is_retryable()` reports `false` for.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, OrchestratorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OrchestratorError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts || !err.is_retryable() => return Err(err),
            Err(err) => {
                let base = err.retry_delay_ms().unwrap_or(250);
                let delay = base.saturating_mul(1u64 << (attempt - 1).min(6));
                tracing::debug!(attempt, delay_ms = delay, error = %err, "retrying after transient error");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}
