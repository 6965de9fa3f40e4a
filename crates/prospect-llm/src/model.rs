//! The scoring model seam used by the intent scoring engine.

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use prospect_core::Result;

use crate::config::LLMConfig;
use crate::providers;
use crate::types::{ChatMessage, CompletionParams, LLMProvider, ResolvedProvider};

/// Text generation used for structured scoring.
#[async_trait]
pub trait ScoringModel: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Scoring model backed by an external chat API.
pub struct HttpScoringModel {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    url: String,
    params: CompletionParams,
}

impl HttpScoringModel {
    pub fn new(resolved: ResolvedProvider) -> Self {
        Self {
            client: Client::new(),
            url: providers::endpoint(resolved.provider).to_string(),
            provider: resolved.provider,
            model: resolved.model,
            api_key: resolved.api_key,
            params: CompletionParams::default(),
        }
    }

    /// Build from the persisted config, or `None` when no provider has a key.
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let resolved = config.require_provider()?;
        info!("Scoring model: {} ({})", resolved.provider, resolved.model);
        Ok(Self::new(resolved).with_params(config.completion_params()))
    }

    /// Send requests to a compatible server instead of the provider default.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }
}

#[async_trait]
impl ScoringModel for HttpScoringModel {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(prompt)];
        providers::complete(
            &self.client,
            self.provider,
            &self.url,
            &messages,
            &self.model,
            &self.api_key,
            self.params,
        )
        .await
    }

    fn name(&self) -> &str {
        &self.model
    }
}
