//! Embedding vectors and their provenance.

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Vector length produced by both the primary API and the offline fallback.
pub const EMBEDDING_DIM: usize = 1536;

/// Which strategy produced a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// External vector embedding API.
    Primary,
    /// Deterministic hash-bucket vector.
    Fallback,
}

impl std::fmt::Display for EmbeddingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A generated embedding with the text it was computed from.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Array1<f32>,
    pub generated_at: DateTime<Utc>,
    /// Canonical text after truncation.
    pub source_text: String,
    pub source: EmbeddingSource,
}

impl Embedding {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// L2 norm of the vector.
    pub fn norm(&self) -> f32 {
        self.vector.dot(&self.vector).sqrt()
    }
}
