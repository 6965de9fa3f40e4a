//! Prospect Scoring — turns detected business signals into a 0–100 intent
//! score.
//!
//! `IntentScoringEngine` asks a language model for a structured score when
//! the evidence is sufficient, validates it, and applies business-rule
//! adjustments. Every failure falls back to a deterministic rule-based score.

pub mod adjust;
pub mod detect;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod fallback;
pub mod parse;
pub mod prompt;
pub mod signals;
pub mod types;
pub mod weights;

pub use adjust::{adjust_score, AdjustedScore};
pub use detect::detect_signals;
pub use engine::{IntentScoringEngine, ScoringConfig};
pub use error::ScoringError;
pub use evidence::{evidence_score, RECENCY_WINDOW_DAYS};
pub use signals::{Importance, Polarity, SignalCatalog, SignalDefinition};
pub use types::*;
pub use weights::normalize_weights;
