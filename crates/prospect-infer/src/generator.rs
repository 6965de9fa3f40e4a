//! Dual-path embedding generator.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use prospect_core::{Embedding, EmbeddingSettings, EmbeddingSource};
use prospect_ingest::truncate_chars;

use crate::embedder::{EmbedderBackend, HashEmbedder};
use crate::rate_limit::RateLimiter;

/// Produces embeddings from the primary backend when possible and from the
/// hash fallback otherwise. Output length is the same on both paths.
pub struct EmbeddingGenerator {
    primary: Option<Arc<dyn EmbedderBackend>>,
    fallback: HashEmbedder,
    limiter: RateLimiter,
    dim: usize,
    max_input_chars: usize,
}

impl EmbeddingGenerator {
    pub fn new(primary: Option<Arc<dyn EmbedderBackend>>, settings: &EmbeddingSettings) -> Self {
        if let Some(p) = &primary {
            if p.dimension() != settings.dimension {
                warn!(
                    "Primary embedder {} reports dim={}, expected {}; mismatched vectors will fall back",
                    p.name(),
                    p.dimension(),
                    settings.dimension
                );
            }
        }
        Self {
            primary,
            fallback: HashEmbedder::new(settings.dimension),
            limiter: RateLimiter::per_minute(settings.rate_limit_per_minute),
            dim: settings.dimension,
            max_input_chars: settings.max_input_chars,
        }
    }

    /// Generator that only uses the offline fallback.
    pub fn fallback_only(dim: usize) -> Self {
        let settings = EmbeddingSettings {
            dimension: dim,
            ..EmbeddingSettings::default()
        };
        Self::new(None, &settings)
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Whether a primary backend is configured and available.
    pub fn has_primary(&self) -> bool {
        self.primary.as_ref().is_some_and(|p| p.is_available())
    }

    /// Embed `text`. Never fails: any primary error, rate-limit denial or
    /// malformed vector falls through to the hash fallback.
    pub async fn embed(&self, text: &str) -> Embedding {
        let source_text = truncate_chars(text, self.max_input_chars).to_string();

        if let Some(primary) = self.primary.as_ref().filter(|p| p.is_available()) {
            if source_text.trim().is_empty() {
                debug!("Empty embedding input, skipping {}", primary.name());
            } else if !self.limiter.try_acquire() {
                warn!("Embedding rate limit reached, using fallback embedding");
            } else {
                match primary.embed(&source_text).await {
                    Ok(vector) if vector.len() == self.dim => {
                        return Embedding {
                            vector,
                            generated_at: Utc::now(),
                            source_text,
                            source: EmbeddingSource::Primary,
                        };
                    }
                    Ok(vector) => warn!(
                        "{} returned {} dims, expected {}; using fallback embedding",
                        primary.name(),
                        vector.len(),
                        self.dim
                    ),
                    Err(e) => warn!("{} embedding failed: {}; using fallback embedding", primary.name(), e),
                }
            }
        }

        self.embed_fallback_text(source_text)
    }

    /// Embed with the offline fallback only.
    pub fn embed_fallback(&self, text: &str) -> Embedding {
        self.embed_fallback_text(truncate_chars(text, self.max_input_chars).to_string())
    }

    fn embed_fallback_text(&self, source_text: String) -> Embedding {
        Embedding {
            vector: self.fallback.embed_sync(&source_text),
            generated_at: Utc::now(),
            source_text,
            source: EmbeddingSource::Fallback,
        }
    }
}
