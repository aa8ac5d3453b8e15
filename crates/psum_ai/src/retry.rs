use std::time::Duration;

use psum_core::config::RetryConfig;
use psum_core::error::AppError;
use tracing::{info, warn};

/// Bounded exponential backoff around a whole summarization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: cfg.base_delay(),
            max_delay: cfg.max_delay(),
        }
    }

    /// No waiting between attempts. Used by tests and local tooling.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before 1-based `attempt`: none for the first, then base, 2*base, 4*base... capped at
    /// `max_delay`.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exp = (attempt - 2).min(31);
        let factor = 1u32 << exp;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn run<T>(&self, op: impl FnMut(u32) -> Result<T, AppError>) -> Result<T, AppError> {
        self.run_with_sleep(op, std::thread::sleep)
    }

    /// Invoke `op` with the 1-based attempt number until it succeeds or attempts run out. Every
    /// error is retried; the last one is returned unchanged.
    pub fn run_with_sleep<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, AppError>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T, AppError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match op(attempt) {
                Ok(v) => {
                    if attempt > 1 {
                        info!(attempt, "succeeded after retry");
                    }
                    return Ok(v);
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(attempt, code = %e.code, "giving up after final attempt");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_before_attempt(attempt + 1);
                    warn!(
                        attempt,
                        max_attempts,
                        code = %e.code,
                        retryable = e.retryable,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed; retrying"
                    );
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
