//! OpenAI-compatible vector embedding API backend.

use async_trait::async_trait;
use ndarray::Array1;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use prospect_core::{Error, Result};

use crate::embedder::EmbedderBackend;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Embedding backend for `POST /embeddings`.
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dim: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: &str, dim: usize) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model, dim)
    }

    /// Point the backend at an OpenAI-compatible server.
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str, dim: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dim,
        }
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "input": text,
        });
        // Only the v3 models accept a target dimension.
        if self.model.starts_with("text-embedding-3") {
            body["dimensions"] = json!(self.dim);
        }
        body
    }
}

#[async_trait]
impl EmbedderBackend for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        debug!("Requesting embedding from {} (model={})", url, self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| Error::Http(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("embedding API returned 429".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!("Embedding API error {}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Invalid embedding response: {}", e)))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("Embedding response contained no data".into()))?
            .embedding;

        if embedding.len() != self.dim {
            return Err(Error::Inference(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dim,
                embedding.len()
            )));
        }

        Ok(Array1::from_vec(embedding))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn name(&self) -> &str {
        "openai"
    }
}
