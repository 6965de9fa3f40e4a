//! Embedding backend trait and the deterministic hash fallback.
//!
//! Implementations:
//! - `OpenAiEmbedder`: external vector API (see `openai.rs`)
//! - `HashEmbedder`: bag-of-words hash buckets, pure and offline

use std::collections::HashSet;

use async_trait::async_trait;
use ndarray::Array1;
use prospect_core::Result;

/// Trait for embedding backends.
#[async_trait]
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    async fn embed(&self, text: &str) -> Result<Array1<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the backend can serve requests.
    fn is_available(&self) -> bool;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Offline embedder that hashes unique words into fixed buckets.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Synchronous form of [`EmbedderBackend::embed`]; never fails.
    pub fn embed_sync(&self, text: &str) -> Array1<f32> {
        hash_embed(text, self.dim)
    }
}

#[async_trait]
impl EmbedderBackend for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Deterministic bag-of-words embedding.
///
/// Lowercase words longer than two characters are deduplicated; each unique
/// word increments the bucket selected by its string hash. The result is
/// L2-normalized, or all zeros when no word qualifies.
pub fn hash_embed(text: &str, dim: usize) -> Array1<f32> {
    let mut vector = Array1::<f32>::zeros(dim);
    if dim == 0 {
        return vector;
    }

    let lowered = text.to_lowercase();
    let unique: HashSet<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .collect();

    for word in unique {
        let bucket = string_hash(word) as usize % dim;
        vector[bucket] += 1.0;
    }

    let norm = vector.dot(&vector).sqrt();
    if norm > 0.0 {
        vector.mapv_inplace(|v| v / norm);
    }
    vector
}

/// 31-multiplier rolling hash over UTF-16 code units with 32-bit wrapping.
fn string_hash(word: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in word.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}
