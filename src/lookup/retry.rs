use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(4);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Bounded exponential backoff for retryable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (zero-based): the base
    /// delay doubled once per prior failure, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempts are used up, returning the
    /// last error in the latter case. At least one attempt is always made.
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(label, |_| true, op).await
    }

    /// Like [`run`](Self::run), but gives up at the first error for which
    /// `retryable` returns false.
    pub async fn run_if<T, E, R, F, Fut>(&self, label: &str, retryable: R, mut op: F) -> Result<T, E>
    where
        E: Display,
        R: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if !retryable(&err) {
                        warn!(
                            target: TARGET_WEB_REQUEST,
                            "{} failed permanently, not retrying: {}", label, err
                        );
                        return Err(err);
                    }
                    if attempt >= max_attempts {
                        error!(
                            target: TARGET_WEB_REQUEST,
                            "{} failed after {} attempts: {}", label, max_attempts, err
                        );
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt - 1);
                    warn!(target: TARGET_WEB_REQUEST, "{} failed: {}", label, err);
                    info!(
                        target: TARGET_WEB_REQUEST,
                        "Retrying {} in {:?}... ({}/{})", label, delay, attempt, max_attempts
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }
    }
}
