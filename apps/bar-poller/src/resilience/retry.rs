//! Retry Driver

use std::fmt::Display;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::policy::RetryPolicy;

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T, E> {
    /// The attempt succeeded.
    Success(T),
    /// The attempt failed in a way another attempt may fix.
    Retryable(E),
    /// The attempt failed and retrying cannot help.
    Fatal(E),
}

/// Terminal failure of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E: Display> {
    /// A non-retryable failure ended the sequence.
    #[error("{error}")]
    Fatal {
        /// Attempts made, including the fatal one.
        attempts: u32,
        /// The fatal error.
        error: E,
    },
    /// Every allowed attempt failed.
    #[error("giving up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last: E,
    },
    /// Shutdown was requested while waiting to retry.
    #[error("cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts made before cancellation.
        attempts: u32,
    },
}

/// Run `operation` until it succeeds, fails fatally, or the policy runs out.
///
/// `operation` receives the zero-based attempt number. After a retryable
/// failure of attempt `n` the driver waits `policy.delay_for(n)`, unless
/// `n` was the last attempt the policy allows.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    shutdown: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T, E>>,
{
    let mut attempt = 0u32;

    loop {
        match operation(attempt).await {
            AttemptOutcome::Success(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Succeeded after retry");
                }
                return Ok(value);
            }
            AttemptOutcome::Fatal(error) => {
                return Err(RetryError::Fatal {
                    attempts: attempt + 1,
                    error,
                });
            }
            AttemptOutcome::Retryable(error) => {
                if attempt >= policy.max_retries {
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last: error,
                    });
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %error,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed, retrying"
                );

                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => {
                        return Err(RetryError::Cancelled {
                            attempts: attempt + 1,
                        });
                    }
                    () = tokio::time::sleep(delay) => {}
                }

                attempt += 1;
            }
        }
    }
}
