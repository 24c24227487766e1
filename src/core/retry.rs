//! Retry helper for transient failures at startup
//!
//! Used for the initial store connection, where the backend may still be
//! coming up when the pipeline starts.

use std::time::Duration;
use tokio::time::sleep;

/// Attempts and backoff for [`retry_async`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
    /// Upper bound for the doubled delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given zero-based failed attempt
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31) as u32).unwrap_or(u32::MAX);
        self.delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or the policy runs out of attempts
///
/// The last error is returned unchanged. A policy with zero attempts still
/// runs the operation once.
///
/// # Examples
/// ```rust
/// use caplist::core::retry::{retry_async, RetryPolicy};
///
/// # async fn example() -> Result<String, String> {
/// let result = retry_async("connect", RetryPolicy::default(), || async {
///     Ok::<String, String>("connected".to_string())
/// })
/// .await?;
/// # Ok(result)
/// # }
/// ```
pub async fn retry_async<F, T, E, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if attempt + 1 >= attempts => return Err(error),
            Err(error) => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "{} failed on attempt {}/{}, retrying in {:?}: {}",
                    operation_name,
                    attempt + 1,
                    attempts,
                    delay,
                    error
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
