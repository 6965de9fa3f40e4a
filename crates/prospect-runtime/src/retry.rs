//! Outer retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use prospect_core::RetrySettings;
use tracing::{info, warn};

use crate::error::JobError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            multiplier: settings.multiplier,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base × multiplier^(retry-1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exp);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        if capped.is_finite() && capped > 0.0 {
            Duration::from_millis(capped as u64)
        } else {
            Duration::ZERO
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. `op` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, JobError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, JobError>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let err = match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !err.is_retryable() {
            return Err(err);
        }
        if attempt == max_attempts {
            return Err(JobError::RetriesExhausted {
                attempts: attempt,
                last_error: Box::new(err),
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "{} attempt {}/{} failed: {}; retrying in {:?}",
            label, attempt, max_attempts, err, delay
        );
        tokio::time::sleep(delay).await;
    }

    // The loop returns on its final iteration.
    Err(JobError::RetriesExhausted {
        attempts: max_attempts,
        last_error: Box::new(JobError::Submission("no attempts made".into())),
    })
}
