//! Sliding-window rate limiter

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default number of requests admitted per window
pub const DEFAULT_MAX_REQUESTS: usize = 60;
/// Default window length
pub const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(60);
/// How often a blocked caller re-checks the window
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Admits at most `max_requests` calls in any `time_window`.
///
/// Keeps the admission timestamps of the calls still inside the window.
/// Callers that find the window full poll until the oldest timestamp ages out.
/// No fairness between concurrent waiters beyond polling order.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    time_window: Duration,
    poll_interval: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per `time_window` (minimum 1)
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            time_window,
            poll_interval: DEFAULT_POLL_INTERVAL,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Override the polling granularity (builder pattern)
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    /// Record a call if the window has room. Never waits.
    pub async fn try_admit(&self) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().await;

        while let Some(oldest) = requests.front() {
            if now.duration_since(*oldest) < self.time_window {
                break;
            }
            requests.pop_front();
        }

        if requests.len() < self.max_requests {
            requests.push_back(now);
            true
        } else {
            false
        }
    }

    /// Wait until the call is admitted
    pub async fn admit(&self) {
        let mut waited = false;
        while !self.try_admit().await {
            if !waited {
                debug!(
                    max_requests = self.max_requests,
                    window_secs = self.time_window.as_secs_f64(),
                    "Rate limit reached, waiting for a free slot"
                );
                waited = true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_TIME_WINDOW)
    }
}
