//! Bounded retry with exponential backoff and jitter for provider calls.

use crate::ports::llm_provider::ProviderError;
use mars_domain::redact_secrets;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry budget for transient provider errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `base * 2^n` plus up to `base` of jitter
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt + 1`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exponential = base_ms.saturating_mul(2u64.saturating_pow(attempt));
        let jitter = if base_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..base_ms)
        };
        Duration::from_millis(exponential.saturating_add(jitter))
    }
}

/// Run `operation`, retrying transient failures according to `policy`.
///
/// Permanent errors are returned immediately; once the budget is spent the
/// last transient error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    participant: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() || attempt >= policy.max_retries => return Err(e),
            Err(e) => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                warn!(
                    participant = %participant,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after transient error: {}",
                    redact_secrets(&e.to_string())
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
