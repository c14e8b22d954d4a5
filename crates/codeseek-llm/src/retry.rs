use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const DEFAULT_BASE_BACKOFF_MS: u64 = 500;

/// Timeout and bounded retry applied to every model service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry.
    pub base_backoff: Duration,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Exponential backoff for the given 0-based retry number.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff
            .saturating_mul(1u32.checked_shl(retry).unwrap_or(u32::MAX))
    }

    /// Run `f` under this policy.
    ///
    /// Each attempt is bounded by `timeout`. Retryable failures are attempted
    /// again up to `max_retries` times with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns the last error once all attempts are exhausted, or the first
    /// non-retryable error.
    pub async fn run<F, Fut, T>(&self, operation: &'static str, mut f: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match tokio::time::timeout(self.timeout, f()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => LlmError::Timeout {
                    operation,
                    seconds: self.timeout.as_secs(),
                },
            };

            if attempt >= self.max_retries || !is_retryable(&err) {
                return Err(err);
            }

            let delay = self.backoff(attempt);
            tracing::warn!(
                operation,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "model call failed, retrying: {err}"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn is_retryable(err: &LlmError) -> bool {
    !matches!(err, LlmError::EmptyResponse { .. })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(max_retries)
            .with_base_backoff(Duration::from_millis(1))
            .with_timeout(Duration::from_millis(200))
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_backoff, Duration::from_millis(500));
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = fast_policy(2)
            .run("test", || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, LlmError>(7) }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_one_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = fast_policy(2)
            .run("test", || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(LlmError::Other("flaky".into()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = fast_policy(2)
            .run("test", || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(LlmError::Unavailable("down".into())) }
            })
            .await;
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn hanging_call_times_out() {
        let policy = RetryPolicy::default()
            .with_max_retries(1)
            .with_base_backoff(Duration::from_millis(1))
            .with_timeout(Duration::from_millis(20));
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = policy
            .run("chat", || {
                c.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;
        assert!(matches!(
            result,
            Err(LlmError::Timeout {
                operation: "chat",
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_response_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = fast_policy(3)
            .run("embed", || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err(LlmError::EmptyResponse { provider: "ollama" }) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn backoff_is_monotonic(retry in 0u32..40) {
            let policy = RetryPolicy::default();
            prop_assert!(policy.backoff(retry + 1) >= policy.backoff(retry));
        }
    }
}
