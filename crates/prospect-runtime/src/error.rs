//! Failure taxonomy for provider jobs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Provider reported failure: {0}")]
    ProviderFailure(String),

    #[error("Timed out after {attempts} poll attempts ({elapsed_ms} ms)")]
    Timeout { attempts: u32, elapsed_ms: u64 },

    #[error("Too many consecutive errors ({count}), last: {last_error}")]
    TooManyTransientErrors { count: u32, last_error: String },

    #[error("Job {job_id} completed with 0 results")]
    ZeroResults { job_id: String },

    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<JobError>,
    },

    #[error("Failed to fetch results: {0}")]
    Results(String),
}

impl JobError {
    /// Whether the outer retry may try the whole job again.
    ///
    /// Only a failed submission qualifies. Once a job exists on the provider,
    /// every later failure is final so a retry never creates a second job.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Submission(_))
    }
}
