//! Exponential backoff around any fallible async operation

use std::future::Future;
use std::time::Duration;
use log::{debug, warn};

/// Retry policy: `max_retries + 1` attempts in total, waiting
/// `min(initial_delay * 2^attempt, max_delay)` between them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy
{   pub max_retries: usize
  , pub initial_delay: Duration
  , pub max_delay: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_retries: usize
    , initial_delay_ms: u64
    , max_delay_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_retries
          , initial_delay: Duration::from_millis(initial_delay_ms)
          , max_delay: Duration::from_millis(max_delay_ms)
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self
    {   RetryPolicy::new(0, 0, 0)
    }

    /// Delay after the zero-based `attempt` failed
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration
    {   let factor = u32::try_from(attempt)
          .ok()
          .and_then(|a| 1u32.checked_shl(a))
          .unwrap_or(u32::MAX);
        self.initial_delay
          .saturating_mul(factor)
          .min(self.max_delay)
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::from(&crate::config::RetryConfig::default())
    }
}

impl From<&crate::config::RetryConfig> for RetryPolicy
{   fn from(config: &crate::config::RetryConfig) -> Self
    {   RetryPolicy::new(
          config.max_retries,
          config.initial_delay_ms,
          config.max_delay_ms
        )
    }
}

/// Retry `operation` on every error. `on_retry(attempt, &err)` runs before
/// each wait with the one-based number of the attempt that just failed.
/// The last error is returned unchanged once retries run out.
pub async fn with_retry<T, E, F, Fut, R>(
  operation: F
, policy: &RetryPolicy
, on_retry: R
) -> Result<T, E>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  R: FnMut(usize, &E)
{   with_retry_if(operation, policy, |_| true, on_retry).await
}

/// Like `with_retry`, but errors for which `should_retry` is false are
/// returned immediately.
pub async fn with_retry_if<T, E, F, Fut, P, R>(
  mut operation: F
, policy: &RetryPolicy
, mut should_retry: P
, mut on_retry: R
) -> Result<T, E>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  P: FnMut(&E) -> bool,
  R: FnMut(usize, &E)
{   let mut attempt = 0;
    loop
    {   match operation().await
        {   Ok(value) => {
              if attempt > 0
              {   debug!("Succeeded after {} retries", attempt);
              }
              return Ok(value);
            }
          , Err(err) => {
              if attempt >= policy.max_retries || !should_retry(&err)
              {   debug!("Giving up after {} attempts", attempt + 1);
                  return Err(err);
              }
              let delay = policy.delay_for_attempt(attempt);
              attempt += 1;
              warn!(
                "Attempt {} failed, retrying in {:?}",
                attempt, delay
              );
              on_retry(attempt, &err);
              tokio::time::sleep(delay).await;
            }
        }
    }
}
