use std::future::Future;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Bounded exponential backoff for transient failures.
///
/// Only server, network and timeout errors are retried. Not-found,
/// permission and authentication failures return immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub const MAX_RETRIES: u32 = 2;
    pub const MAX_DELAY: Duration = Duration::from_secs(30);

    /// Retries and delay are clamped to 2 attempts and 30 seconds
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.min(Self::MAX_RETRIES),
            base_delay,
            max_delay: max_delay.min(Self::MAX_DELAY),
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// `retries_done` is the number of retries already made
    pub fn should_retry(&self, retries_done: u32, error: &ClientError) -> bool {
        retries_done < self.max_retries && error.is_transient()
    }

    /// Delay before retry number `retries_done + 1`
    pub fn delay_for(&self, retries_done: u32) -> Duration {
        let factor = 2u32.saturating_pow(retries_done);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries_done = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(retries_done, &e) => {
                    let delay = self.delay_for(retries_done);
                    tracing::warn!(
                        "Attempt {} failed ({}), retrying in {:?}",
                        retries_done + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retries_done += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::MAX_RETRIES, Duration::from_secs(1), Self::MAX_DELAY)
    }
}
