//! Shared services wired from configuration.

use std::sync::Arc;

use prospect_connectors::ExaWebsetsClient;
use prospect_core::ProspectConfig;
use prospect_infer::{create_generator, EmbeddingGenerator};
use prospect_llm::{HttpScoringModel, LLMConfig, ScoringModel};
use prospect_runtime::{EmbeddingPipeline, SearchOrchestrator};
use prospect_scoring::IntentScoringEngine;
use prospect_store::{EntityStore, SqliteStore};
use tracing::{info, warn};

/// Everything a command needs, built once at startup.
pub struct AppContext {
    pub config: ProspectConfig,
    pub store: Arc<SqliteStore>,
    pub generator: Arc<EmbeddingGenerator>,
    pub pipeline: EmbeddingPipeline,
    /// `None` when no search provider key is configured.
    pub orchestrator: Option<SearchOrchestrator>,
    pub engine: IntentScoringEngine,
}

impl AppContext {
    pub fn new(config: ProspectConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.data_paths.db, config.embedding.dimension)
            .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
        let store = Arc::new(store);

        let generator = Arc::new(create_generator(
            &config.embedding,
            config.keys.openai_api_key.as_deref(),
        ));
        let pipeline = EmbeddingPipeline::new(
            store.clone() as Arc<dyn EntityStore>,
            generator.clone(),
            config.batch.clone(),
        );

        let orchestrator = match config.keys.exa_api_key.as_deref() {
            Some(key) => Some(SearchOrchestrator::from_settings(
                Arc::new(ExaWebsetsClient::new(key)),
                &config.poll,
                &config.retry,
            )),
            None => {
                warn!("EXA_API_KEY not set; search and enrichment are unavailable");
                None
            }
        };

        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
        let model = match HttpScoringModel::from_config(&llm_config) {
            Ok(m) => Some(Arc::new(m) as Arc<dyn ScoringModel>),
            Err(e) => {
                info!("{}; intent scores use the rule-based path", e);
                None
            }
        };
        let engine = IntentScoringEngine::new(model);

        Ok(Self {
            config,
            store,
            generator,
            pipeline,
            orchestrator,
            engine,
        })
    }

    pub fn orchestrator(&self) -> anyhow::Result<&SearchOrchestrator> {
        self.orchestrator
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Search provider not configured (set EXA_API_KEY)"))
    }
}
