//! Prospect Infer — embedding generation.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! `OpenAiEmbedder` calls the vector embedding API when a key is configured;
//! `HashEmbedder` is the deterministic offline fallback. `EmbeddingGenerator`
//! combines both and never fails outward.

pub mod embedder;
pub mod generator;
pub mod openai;
pub mod policy;
pub mod rate_limit;

pub use embedder::{hash_embed, EmbedderBackend, HashEmbedder};
pub use generator::EmbeddingGenerator;
pub use openai::OpenAiEmbedder;
pub use policy::{needs_regeneration, STALENESS_WINDOW_DAYS};
pub use rate_limit::RateLimiter;

use std::sync::Arc;

use prospect_core::EmbeddingSettings;

/// Create the best available generator for the given settings.
///
/// Uses the vector API when a key is present, otherwise every embedding is
/// produced by the hash fallback.
pub fn create_generator(settings: &EmbeddingSettings, api_key: Option<&str>) -> EmbeddingGenerator {
    match api_key {
        Some(key) => {
            let primary = OpenAiEmbedder::new(key, &settings.model, settings.dimension);
            tracing::info!(
                "Using {} embeddings (model={}, dim={}, limit={}/min)",
                primary.name(),
                settings.model,
                settings.dimension,
                settings.rate_limit_per_minute
            );
            EmbeddingGenerator::new(Some(Arc::new(primary)), settings)
        }
        None => {
            tracing::warn!(
                "No embedding API key configured. Using hash fallback embeddings (dim={}).",
                settings.dimension
            );
            EmbeddingGenerator::new(None, settings)
        }
    }
}
