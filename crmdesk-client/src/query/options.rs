use std::time::Duration;

use super::RetryPolicy;

/// Cache behaviour of one query type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// How long a result is served without refetching
    pub stale_time: Duration,
    /// How long an unused entry is kept before eviction
    pub gc_time: Duration,
    pub retry: RetryPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            gc_time: Duration::from_secs(5 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

impl QueryOptions {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
