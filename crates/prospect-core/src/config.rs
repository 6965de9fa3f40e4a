//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::embedding::EMBEDDING_DIM;

/// Paths to all Prospect data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Entity database directory (`data/db/`).
    pub db: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.db)?;
        Ok(paths)
    }
}

/// API keys for the third-party providers. Keys are never serialized.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    /// Websets search/enrichment provider.
    pub exa_api_key: Option<String>,
    /// Vector embedding API.
    pub openai_api_key: Option<String>,
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Primary embedding model name.
    pub model: String,
    /// Vector length shared by the primary and fallback paths.
    pub dimension: usize,
    /// Primary API requests allowed per rolling minute.
    pub rate_limit_per_minute: u32,
    /// Input is truncated to this many characters before the primary call.
    pub max_input_chars: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".into(),
            dimension: EMBEDDING_DIM,
            rate_limit_per_minute: 3000,
            max_input_chars: 8000,
        }
    }
}

/// Provider job polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            max_attempts: 120,
            max_consecutive_errors: 5,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Outer retry settings for job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

/// Batch admission control for bulk embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub delay_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay_ms: 1000,
        }
    }
}

/// Top-level Prospect configuration.
#[derive(Debug, Clone)]
pub struct ProspectConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub keys: ProviderKeys,
    pub embedding: EmbeddingSettings,
    pub poll: PollSettings,
    pub retry: RetrySettings,
    pub batch: BatchSettings,
}

impl ProspectConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let keys = ProviderKeys {
            exa_api_key: non_empty_env("EXA_API_KEY"),
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
        };

        let defaults = EmbeddingSettings::default();
        let embedding = EmbeddingSettings {
            model: non_empty_env("EMBEDDING_MODEL").unwrap_or(defaults.model),
            dimension: parsed_env("EMBEDDING_DIMENSION").unwrap_or(defaults.dimension),
            rate_limit_per_minute: parsed_env("EMBEDDING_RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.rate_limit_per_minute),
            max_input_chars: defaults.max_input_chars,
        };

        let poll_defaults = PollSettings::default();
        let poll = PollSettings {
            interval_ms: parsed_env("POLL_INTERVAL_MS").unwrap_or(poll_defaults.interval_ms),
            max_attempts: parsed_env("POLL_MAX_ATTEMPTS").unwrap_or(poll_defaults.max_attempts),
            max_consecutive_errors: poll_defaults.max_consecutive_errors,
        };

        Ok(Self {
            data_paths,
            keys,
            embedding,
            poll,
            retry: RetrySettings::default(),
            batch: BatchSettings::default(),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
