//! Runtime result types.

use serde::Serialize;

use prospect_connectors::JobKind;
use prospect_core::EmbeddingSource;

/// Items produced by a completed provider job.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub job_id: String,
    pub kind: JobKind,
    pub items: Vec<serde_json::Value>,
    /// Set when fewer items than the requested minimum came back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What `EmbeddingPipeline::refresh` did for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The stored embedding is fresh enough.
    Skipped,
    Regenerated { source: EmbeddingSource },
}

/// Totals for a batch of refreshes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub entity_ids: Vec<String>,
    pub regenerated: usize,
    pub fallback: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RefreshReport {
    pub(crate) fn record(&mut self, id: String, outcome: &prospect_core::Result<RefreshOutcome>) {
        match outcome {
            Ok(RefreshOutcome::Skipped) => self.skipped += 1,
            Ok(RefreshOutcome::Regenerated { source }) => {
                self.regenerated += 1;
                if *source == EmbeddingSource::Fallback {
                    self.fallback += 1;
                }
            }
            Err(_) => self.failed += 1,
        }
        self.entity_ids.push(id);
    }
}
