use crate::shared::errors::{AppError, AppResult};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::{log_debug, log_warn};

/// Retry configuration for pipeline steps and external calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
    /// Wall-clock budget for the whole operation, retries included
    pub budget: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            // Jitter would break the non-decreasing delay sequence the
            // processing job is tuned for, so it is opt-in here.
            jitter: false,
            budget: Duration::from_secs(300),
        }
    }
}

/// Retry utility with exponential backoff
pub struct RetryUtil;

impl RetryUtil {
    /// Execute an operation with retry logic and exponential backoff.
    ///
    /// Every error is considered retryable; the operation is re-run from the
    /// top on each attempt. Gives up after `max_attempts` attempts or when
    /// the next delay would exceed the wall-clock budget, returning the last
    /// error either way.
    pub async fn with_retry<F, Fut, T>(
        operation: F,
        config: &RetryConfig,
        operation_name: &str,
    ) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = AppResult<T>>,
    {
        let started = Instant::now();

        for attempt in 1..=config.max_attempts {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        log_debug!(
                            "{} succeeded on attempt {} of {}",
                            operation_name,
                            attempt,
                            config.max_attempts
                        );
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if attempt >= config.max_attempts {
                        log_warn!(
                            "{} failed on final attempt {} ({}), giving up",
                            operation_name,
                            attempt,
                            error
                        );
                        return Err(error);
                    }

                    let delay = Self::calculate_delay(attempt, config);
                    if started.elapsed() + delay >= config.budget {
                        log_warn!(
                            "{} failed on attempt {} ({}) and the retry budget of {:?} is spent, giving up",
                            operation_name,
                            attempt,
                            error,
                            config.budget
                        );
                        return Err(error);
                    }

                    log_warn!(
                        "{} failed on attempt {} ({}), retrying in {:?}",
                        operation_name,
                        attempt,
                        error,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }

        Err(AppError::InternalError(format!(
            "{} retry loop ended without a result",
            operation_name
        )))
    }

    /// Delay before the attempt following `attempt` (1-based), with
    /// exponential backoff capped at `max_delay`
    fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
        let exponential_delay = config.base_delay.as_millis() as f64
            * config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(exponential_delay as u64);

        // Cap at max delay
        if delay > config.max_delay {
            delay = config.max_delay;
        }

        // Optional jitter to prevent thundering herd
        if config.jitter {
            let jitter_factor = 0.1; // 10% jitter
            let jitter_ms =
                (delay.as_millis() as f64 * jitter_factor * rand::random::<f64>()) as u64;
            delay = Duration::from_millis(delay.as_millis() as u64 + jitter_ms);
        }

        delay
    }
}
