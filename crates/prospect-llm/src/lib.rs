//! Language-model access for intent scoring.
//!
//! Completions go to external APIs (OpenAI, Anthropic, Groq); no local model
//! is required. Provider selection is persisted in `llm-config.json`.

pub mod config;
pub mod model;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use model::{HttpScoringModel, ScoringModel};
pub use types::*;
