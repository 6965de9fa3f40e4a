//! Prospect Runtime — asynchronous job handling and entity materialization.
//!
//! `poll` and `retry_with_backoff` are the only places that wait on a
//! provider; `SearchOrchestrator` composes them for search and enrichment
//! jobs, and `EmbeddingPipeline` turns result items into embedded entities.

pub mod batch;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod poller;
pub mod retry;
pub mod types;

pub use batch::run_batched;
pub use error::JobError;
pub use orchestrator::SearchOrchestrator;
pub use pipeline::EmbeddingPipeline;
pub use poller::{poll, PollAttempt, PollConfig, PollOutcome};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use types::*;
