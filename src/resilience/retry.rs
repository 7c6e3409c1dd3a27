//! Bounded exponential backoff with jitter
//!
//! `RetryPolicy::run` wraps any async operation returning a `RetryableError`:
//! the rate limiter is awaited before every attempt, retryable failures sleep
//! `base * 2^(attempt-1) + uniform(0, max_jitter)` before the next attempt,
//! permanent failures are returned immediately, and the last retryable failure
//! is wrapped with the attempt count once the ceiling is reached.

use super::RateLimiter;
use crate::error::ApiError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default total attempts (first call included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound of the random jitter added to each delay
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(1);

/// Errors the retry loop knows how to classify
pub trait RetryableError: std::fmt::Display + Sized {
    /// Whether another attempt may succeed
    fn is_retryable(&self) -> bool;

    /// Wrap the last failure once all attempts are spent
    fn exhausted(attempts: u32, last: Self) -> Self;
}

impl RetryableError for ApiError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. } | ApiError::Server { .. } | ApiError::Transport(_)
        )
    }

    fn exhausted(attempts: u32, last: Self) -> Self {
        ApiError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each following one
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Policy allowing `retries` retries after the first attempt
    pub fn with_retries(retries: u32) -> Self {
        Self::new(retries.saturating_add(1))
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Number of retries after the first attempt
    pub fn retries(&self) -> u32 {
        self.max_attempts.max(1) - 1
    }

    /// Deterministic part of the delay after failed attempt `attempt` (1-indexed)
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Full delay after failed attempt `attempt`, jitter included
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = self.max_jitter.as_secs_f64() * rand::random::<f64>();
        self.base_backoff(attempt) + Duration::from_secs_f64(jitter)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, E, F, Fut>(
        &self,
        limiter: Option<&RateLimiter>,
        operation: &str,
        mut op: F,
    ) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if let Some(limiter) = limiter {
                limiter.admit().await;
            }

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "Attempt failed with a permanent error");
                    return Err(e);
                }
                Err(e) if attempt >= max_attempts => {
                    error!(operation, attempts = attempt, error = %e, "Giving up after retries");
                    return Err(E::exhausted(attempt, e));
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn server_error() -> ApiError {
        ApiError::Server {
            status: 503,
            message: "unavailable".into(),
        }
    }

    fn no_jitter(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts).with_max_jitter(Duration::ZERO)
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retries(), 2);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(RetryPolicy::with_retries(3).max_attempts, 4);
    }

    #[test]
    fn test_backoff_is_non_decreasing() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = (1..=8).map(|a| policy.base_backoff(a)).collect();
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[1], Duration::from_secs(2));
        assert_eq!(delays[2], Duration::from_secs(4));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=4 {
            for _ in 0..50 {
                let delay = policy.delay_for(attempt);
                let base = policy.base_backoff(attempt);
                assert!(delay >= base);
                assert!(delay <= base + Duration::from_secs(1));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<&str, ApiError> = no_jitter(3)
            .run(None, "test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_bounds_attempts_and_sleeps_between() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();
        let result: Result<(), ApiError> = no_jitter(3)
            .run(None, "test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ApiError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, ApiError::Server { status: 503, .. }));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        // 1s after the first failure, 2s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_never_exceed_retries_plus_one() {
        for retries in 0..5 {
            let policy = RetryPolicy::with_retries(retries).with_max_jitter(Duration::ZERO);
            let calls = AtomicU32::new(0);
            let calls = &calls;
            let _: Result<(), ApiError> = policy
                .run(None, "test", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::RateLimited {
                        message: String::new(),
                    })
                })
                .await;
            assert_eq!(calls.load(Ordering::SeqCst), retries + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_short_circuits() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();
        let result: Result<(), ApiError> = no_jitter(5)
            .run(None, "test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::NotFound {
                    path: "/v1/notes/missing".into(),
                })
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ApiError::NotFound { .. })));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_is_awaited_before_each_attempt() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        let result: Result<(), ApiError> = no_jitter(3)
            .run(Some(&limiter), "test", move || async move {
                Err(ApiError::Transport("connection refused".into()))
            })
            .await;
        assert!(matches!(result, Err(ApiError::RetriesExhausted { attempts: 3, .. })));
        // Third attempt had to wait for the first admission to leave the window
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(server_error().is_retryable());
        assert!(ApiError::RateLimited {
            message: String::new()
        }
        .is_retryable());
        assert!(ApiError::Transport("timeout".into()).is_retryable());
        assert!(!ApiError::NotFound { path: "/".into() }.is_retryable());
        assert!(!ApiError::Validation {
            message: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Authentication {
            status: 401,
            message: String::new()
        }
        .is_retryable());
    }
}
