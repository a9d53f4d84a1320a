use crate::error::UpstreamError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Bounded retry for upstream calls
///
/// The operation is attempted at most `max_attempts` times. A failed attempt
/// is retried only while `retry_if` accepts the error.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retry_if: fn(&UpstreamError) -> bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_if: fn(&UpstreamError) -> bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
            retry_if,
        }
    }

    /// One retry on connection resets and rate limits
    pub fn transient() -> Self {
        Self::new(2, UpstreamError::is_transient)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Pause between attempts (default: none)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn should_retry(&self, attempt: u32, error: &UpstreamError) -> bool {
        attempt < self.max_attempts && (self.retry_if)(error)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if self.should_retry(attempt, &error) => {
                    info!(
                        "Retrying upstream call after: {} (attempts remaining: {})",
                        error,
                        self.max_attempts - attempt
                    );
                    if !self.delay.is_zero() {
                        sleep(self.delay).await;
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn status(code: u16) -> UpstreamError {
        UpstreamError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_retries_once_then_gives_up() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::transient();

        let result: Result<(), _> = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(status(429))
            })
            .await;

        assert!(matches!(result, Err(UpstreamError::Status { status: 429, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::transient();

        let result: Result<(), _> = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(status(500))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_reset() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::transient();

        let result = policy
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(UpstreamError::ConnectionReset("reset".into()))
                } else {
                    Ok("answer")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_attempts_never_below_one() {
        let policy = RetryPolicy::new(0, UpstreamError::is_transient);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.should_retry(1, &status(429)));
    }
}
