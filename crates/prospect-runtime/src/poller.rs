//! Generic long-poll loop.

use std::future::Future;
use std::time::{Duration, Instant};

use prospect_core::PollSettings;
use tracing::{debug, info, warn};

use crate::error::JobError;

/// What one status check observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// Still running, check again after the interval.
    Continue,
    Success(T),
    /// The provider declared the job failed.
    TerminalFailure(String),
    /// The check itself failed (network, 5xx); may succeed next time.
    TransientError(String),
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from(&PollSettings::default())
    }
}

impl From<&PollSettings> for PollConfig {
    fn from(settings: &PollSettings) -> Self {
        Self {
            interval: settings.interval(),
            max_attempts: settings.max_attempts,
            max_consecutive_errors: settings.max_consecutive_errors,
        }
    }
}

/// Per-call state handed to each check. Never shared between calls.
#[derive(Debug, Clone)]
pub struct PollAttempt {
    pub attempt_number: u32,
    pub elapsed_ms: u64,
    pub last_error: Option<String>,
}

/// Call `check` until it succeeds, fails terminally, or the budget runs out.
///
/// Every check counts against `max_attempts`. Transient errors also count
/// towards the consecutive-error threshold, which any other outcome resets.
/// The only suspension point is the sleep between checks.
pub async fn poll<T, F, Fut>(label: &str, config: &PollConfig, mut check: F) -> Result<T, JobError>
where
    F: FnMut(PollAttempt) -> Fut,
    Fut: Future<Output = PollOutcome<T>>,
{
    let started = Instant::now();
    let mut consecutive_errors = 0u32;
    let mut last_error: Option<String> = None;

    for attempt_number in 1..=config.max_attempts {
        let attempt = PollAttempt {
            attempt_number,
            elapsed_ms: started.elapsed().as_millis() as u64,
            last_error: last_error.clone(),
        };

        match check(attempt).await {
            PollOutcome::Success(value) => {
                info!(
                    "{} completed after {} attempts ({} ms)",
                    label,
                    attempt_number,
                    started.elapsed().as_millis()
                );
                return Ok(value);
            }
            PollOutcome::TerminalFailure(reason) => {
                warn!("{} failed at attempt {}: {}", label, attempt_number, reason);
                return Err(JobError::ProviderFailure(reason));
            }
            PollOutcome::Continue => {
                consecutive_errors = 0;
                last_error = None;
                debug!("{} still running (attempt {}/{})", label, attempt_number, config.max_attempts);
            }
            PollOutcome::TransientError(reason) => {
                consecutive_errors += 1;
                warn!(
                    "{} status check failed ({} consecutive): {}",
                    label, consecutive_errors, reason
                );
                if consecutive_errors >= config.max_consecutive_errors {
                    return Err(JobError::TooManyTransientErrors {
                        count: consecutive_errors,
                        last_error: reason,
                    });
                }
                last_error = Some(reason);
            }
        }

        if attempt_number < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    Err(JobError::Timeout {
        attempts: config.max_attempts,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}
