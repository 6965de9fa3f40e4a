//! Store-level data types.

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::Serialize;

use prospect_core::{Embedding, EmbeddingSource, EntityKind};

/// Fields written back after generating an embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingUpdate {
    pub embedding: Array1<f32>,
    pub embedding_text: String,
    pub generated_at: DateTime<Utc>,
    pub source: EmbeddingSource,
    /// Replaces stored keywords when present.
    pub search_keywords: Option<Vec<String>>,
    /// Replaces the stored summary when present.
    pub semantic_summary: Option<String>,
}

impl EmbeddingUpdate {
    pub fn from_embedding(embedding: Embedding) -> Self {
        Self {
            embedding: embedding.vector,
            embedding_text: embedding.source_text,
            generated_at: embedding.generated_at,
            source: embedding.source,
            search_keywords: None,
            semantic_summary: None,
        }
    }
}

/// Vector search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarEntity {
    pub entity_id: String,
    pub kind: EntityKind,
    pub score: f64,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_entities: i64,
    pub embeddings_stored: i64,
    pub fallback_embeddings: i64,
    pub embedding_dimension: usize,
    pub db_path: String,
}
