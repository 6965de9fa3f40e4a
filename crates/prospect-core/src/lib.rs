//! Prospect Core — shared errors, configuration and domain records.

pub mod config;
pub mod embedding;
pub mod entity;
pub mod error;
pub mod signal;

pub use config::{
    BatchSettings, DataPaths, EmbeddingSettings, PollSettings, ProspectConfig, ProviderKeys,
    RetrySettings,
};
pub use embedding::{Embedding, EmbeddingSource, EMBEDDING_DIM};
pub use entity::{EntityKind, EntityRecord};
pub use error::{Error, Result};
pub use signal::{EvidenceItem, SignalResult};
