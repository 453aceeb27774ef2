pub mod logger;
pub mod rate_limiter;
pub mod retry;

pub use logger::{init_logger, TimedOperation};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryConfig, RetryUtil};
