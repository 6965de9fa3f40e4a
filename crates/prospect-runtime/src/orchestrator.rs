//! Search orchestrator: a provider job from creation to result set.

use std::sync::Arc;

use prospect_connectors::{
    EnrichmentSpec, JobKind, JobPhase, JobStatus, ProviderApi, SearchJobSpec,
};
use prospect_core::{PollSettings, RetrySettings};
use tracing::{info, warn};

use crate::error::JobError;
use crate::poller::{poll, PollConfig, PollOutcome};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::ResultSet;

/// Drives search and enrichment jobs through one provider.
pub struct SearchOrchestrator {
    provider: Arc<dyn ProviderApi>,
    poll: PollConfig,
    retry: RetryPolicy,
}

fn classify(job_id: &str, status: JobStatus) -> PollOutcome<JobStatus> {
    match status.phase() {
        JobPhase::Succeeded => PollOutcome::Success(status),
        JobPhase::Failed => PollOutcome::TerminalFailure(format!("job {} is {}", job_id, status)),
        JobPhase::Active => PollOutcome::Continue,
    }
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn ProviderApi>, poll: PollConfig, retry: RetryPolicy) -> Self {
        Self {
            provider,
            poll,
            retry,
        }
    }

    pub fn from_settings(
        provider: Arc<dyn ProviderApi>,
        poll: &PollSettings,
        retry: &RetrySettings,
    ) -> Self {
        Self::new(provider, PollConfig::from(poll), RetryPolicy::from(retry))
    }

    /// Create a search job, wait for it, and fetch its items.
    pub async fn create_and_await(&self, spec: &SearchJobSpec) -> Result<ResultSet, JobError> {
        let job = self
            .provider
            .create_search(spec)
            .await
            .map_err(|e| JobError::Submission(e.to_string()))?;
        info!(
            "Created {} search job {} for {:?} (count={}, excluding {})",
            self.provider.name(),
            job.id,
            spec.query,
            spec.count,
            spec.exclude.len()
        );

        let label = format!("search {}", job.id);
        poll(&label, &self.poll, |_attempt| {
            let provider = self.provider.clone();
            let job_id = job.id.clone();
            async move {
                match provider.get_job_status(&job_id).await {
                    Ok(status) => classify(&job_id, status),
                    Err(e) => PollOutcome::TransientError(e.to_string()),
                }
            }
        })
        .await?;

        self.fetch_results(&job.id, JobKind::Search, spec.min_results)
            .await
    }

    /// [`create_and_await`](Self::create_and_await) wrapped in the outer
    /// retry. Each retry submits a fresh job.
    pub async fn create_and_await_with_retry(
        &self,
        spec: &SearchJobSpec,
    ) -> Result<ResultSet, JobError> {
        retry_with_backoff("search", &self.retry, |_attempt| self.create_and_await(spec)).await
    }

    /// Attach an enrichment to a completed search job and wait for it.
    pub async fn enrich_and_await(
        &self,
        job_id: &str,
        spec: &EnrichmentSpec,
    ) -> Result<ResultSet, JobError> {
        let enrichment = self
            .provider
            .create_enrichment(job_id, spec)
            .await
            .map_err(|e| JobError::Submission(e.to_string()))?;
        info!(
            "Created enrichment {} on job {}: {:?}",
            enrichment.id, job_id, spec.description
        );

        let label = format!("enrichment {}", enrichment.id);
        poll(&label, &self.poll, |_attempt| {
            let provider = self.provider.clone();
            let job_id = job_id.to_string();
            let enrichment_id = enrichment.id.clone();
            async move {
                match provider.get_enrichment_status(&job_id, &enrichment_id).await {
                    Ok(status) => classify(&enrichment_id, status),
                    Err(e) => PollOutcome::TransientError(e.to_string()),
                }
            }
        })
        .await?;

        self.fetch_results(job_id, JobKind::Enrichment, 0).await
    }

    async fn fetch_results(
        &self,
        job_id: &str,
        kind: JobKind,
        min_results: usize,
    ) -> Result<ResultSet, JobError> {
        let items = self
            .provider
            .list_items(job_id)
            .await
            .map_err(|e| JobError::Results(e.to_string()))?;

        if items.is_empty() {
            return Err(JobError::ZeroResults {
                job_id: job_id.to_string(),
            });
        }

        let warning = (items.len() < min_results).then(|| {
            format!(
                "Only {} results returned, {} requested at minimum",
                items.len(),
                min_results
            )
        });
        if let Some(w) = &warning {
            warn!("Job {}: {}", job_id, w);
        }

        info!("Job {} returned {} items", job_id, items.len());
        Ok(ResultSet {
            job_id: job_id.to_string(),
            kind,
            items,
            warning,
        })
    }
}
