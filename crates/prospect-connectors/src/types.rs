//! Provider job and knowledge-document types.

use serde::{Deserialize, Serialize};

use prospect_core::{EntityKind, EvidenceItem};

/// What a provider job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Search,
    Enrichment,
}

/// Status reported by the provider for a search or enrichment job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Idle,
    Completed,
    Paused,
    Canceled,
    /// A status string this client does not recognise.
    Other(String),
}

/// Coarse lifecycle family of a [`JobStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Active,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "idle" => Self::Idle,
            "completed" => Self::Completed,
            "paused" => Self::Paused,
            "canceled" | "cancelled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }

    /// Unrecognised statuses are treated as still in progress.
    pub fn phase(&self) -> JobPhase {
        match self {
            Self::Idle | Self::Completed => JobPhase::Succeeded,
            Self::Paused | Self::Canceled => JobPhase::Failed,
            Self::Pending | Self::Running | Self::Other(_) => JobPhase::Active,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job created at the provider. Lives for one orchestration call.
#[derive(Debug, Clone)]
pub struct ProviderJob {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Where results are read from once the job completes.
    pub result_location: Option<String>,
}

/// Parameters of a provider search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobSpec {
    pub query: String,
    pub count: usize,
    pub entity_kind: EntityKind,
    /// Provider identifiers to leave out of the results.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Fewer results than this produce a warning, not an error.
    #[serde(default)]
    pub min_results: usize,
}

impl SearchJobSpec {
    pub fn new(query: impl Into<String>, count: usize, entity_kind: EntityKind) -> Self {
        Self {
            query: query.into(),
            count,
            entity_kind,
            exclude: Vec::new(),
            min_results: 0,
        }
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_min_results(mut self, min_results: usize) -> Self {
        self.min_results = min_results;
        self
    }
}

/// Parameters of an enrichment on a completed search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSpec {
    pub description: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".into()
}

impl EnrichmentSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            format: default_format(),
        }
    }
}

/// Account being researched by the knowledge-base collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionTarget {
    pub company_name: String,
}

impl CollectionTarget {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
        }
    }
}

/// A document produced by a knowledge-base collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(default = "default_source_type", alias = "sourceType")]
    pub source_type: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_source_type() -> String {
    "web".into()
}

fn default_confidence() -> f64 {
    0.5
}

/// Longest evidence summary taken from a document.
const SUMMARY_CHARS: usize = 300;

impl KnowledgeDocument {
    /// Title and content as one searchable string.
    pub fn full_text(&self) -> String {
        if self.title.is_empty() {
            self.content.clone()
        } else {
            format!("{} {}", self.title, self.content)
        }
    }

    pub fn to_evidence(&self) -> EvidenceItem {
        let text = if self.content.trim().is_empty() {
            &self.title
        } else {
            &self.content
        };
        EvidenceItem {
            source: self.source.clone(),
            url: self.url.clone().unwrap_or_default(),
            date: self.published_at.clone(),
            summary: text.trim().chars().take(SUMMARY_CHARS).collect(),
            confidence: self.confidence,
            source_type: self.source_type.clone(),
        }
    }
}
