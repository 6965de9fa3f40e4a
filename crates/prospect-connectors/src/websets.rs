//! Exa Websets provider API.
//!
//! A webset is an asynchronous search job: it is created with a query,
//! runs at the provider, and exposes its items once idle. Enrichments are
//! secondary jobs attached to a finished webset.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use prospect_core::{EntityKind, Error, Result};

use crate::types::{EnrichmentSpec, JobKind, JobStatus, ProviderJob, SearchJobSpec};

pub const DEFAULT_BASE_URL: &str = "https://api.exa.ai/websets/v0";

/// Asynchronous search/enrichment provider.
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Submit a search job.
    async fn create_search(&self, spec: &SearchJobSpec) -> Result<ProviderJob>;

    async fn get_job_status(&self, job_id: &str) -> Result<JobStatus>;

    /// Items of a completed search job.
    async fn list_items(&self, job_id: &str) -> Result<Vec<serde_json::Value>>;

    /// Attach an enrichment to an already-completed search job.
    async fn create_enrichment(&self, job_id: &str, spec: &EnrichmentSpec) -> Result<ProviderJob>;

    async fn get_enrichment_status(&self, job_id: &str, enrichment_id: &str) -> Result<JobStatus>;

    fn name(&self) -> &str;
}

/// HTTP client for the Exa Websets API.
pub struct ExaWebsetsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct JobResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

fn provider_entity_type(kind: EntityKind) -> Result<&'static str> {
    match kind {
        EntityKind::Company => Ok("company"),
        EntityKind::Employee => Ok("person"),
        EntityKind::Enrichment => Err(Error::Config(
            "Enrichment records cannot be searched directly".into(),
        )),
    }
}

pub(crate) fn search_body(spec: &SearchJobSpec) -> Result<serde_json::Value> {
    let mut body = json!({
        "search": {
            "query": spec.query,
            "count": spec.count,
            "entity": { "type": provider_entity_type(spec.entity_kind)? },
        }
    });
    if !spec.exclude.is_empty() {
        body["exclude"] = json!(spec.exclude);
    }
    Ok(body)
}

impl ExaWebsetsClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Websets request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("Websets API returned 429".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("Websets API error {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Invalid Websets response: {}", e)))
    }
}

#[async_trait]
impl ProviderApi for ExaWebsetsClient {
    async fn create_search(&self, spec: &SearchJobSpec) -> Result<ProviderJob> {
        let body = search_body(spec)?;
        debug!(
            "Creating webset: query={:?} count={} exclude={}",
            spec.query,
            spec.count,
            spec.exclude.len()
        );
        let job: JobResponse = self
            .send(self.client.post(self.url("/websets")).json(&body))
            .await?;
        Ok(ProviderJob {
            result_location: Some(format!("/websets/{}/items", job.id)),
            status: JobStatus::parse(job.status.as_deref().unwrap_or("pending")),
            kind: JobKind::Search,
            id: job.id,
        })
    }

    async fn get_job_status(&self, job_id: &str) -> Result<JobStatus> {
        let resp: StatusResponse = self
            .send(self.client.get(self.url(&format!("/websets/{}", job_id))))
            .await?;
        Ok(JobStatus::parse(&resp.status))
    }

    async fn list_items(&self, job_id: &str) -> Result<Vec<serde_json::Value>> {
        let resp: ItemsResponse = self
            .send(self.client.get(self.url(&format!("/websets/{}/items", job_id))))
            .await?;
        Ok(resp.data)
    }

    async fn create_enrichment(&self, job_id: &str, spec: &EnrichmentSpec) -> Result<ProviderJob> {
        let body = json!({ "description": spec.description, "format": spec.format });
        let job: JobResponse = self
            .send(
                self.client
                    .post(self.url(&format!("/websets/{}/enrichments", job_id)))
                    .json(&body),
            )
            .await?;
        Ok(ProviderJob {
            result_location: Some(format!("/websets/{}/items", job_id)),
            status: JobStatus::parse(job.status.as_deref().unwrap_or("pending")),
            kind: JobKind::Enrichment,
            id: job.id,
        })
    }

    async fn get_enrichment_status(&self, job_id: &str, enrichment_id: &str) -> Result<JobStatus> {
        let path = format!("/websets/{}/enrichments/{}", job_id, enrichment_id);
        let resp: StatusResponse = self.send(self.client.get(self.url(&path))).await?;
        Ok(JobStatus::parse(&resp.status))
    }

    fn name(&self) -> &str {
        "exa-websets"
    }
}
