//! Call admission and retry for outbound requests
//!
//! - `RateLimiter`: sliding-window gate awaited before every attempt
//! - `RetryPolicy`: bounded exponential backoff with jitter, short-circuiting
//!   on permanent failures

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::RateLimiter;
pub use retry::{RetryPolicy, RetryableError};
