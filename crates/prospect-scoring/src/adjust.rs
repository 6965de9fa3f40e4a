//! Business-rule corrections applied after a structured score.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use prospect_core::SignalResult;
use tracing::debug;

use crate::evidence::RECENCY_WINDOW_DAYS;
use crate::signals::SignalCatalog;
use crate::types::ScoreFactor;

const UNSUPPORTED_FACTOR_PENALTY: f64 = -8.0;
const UNSUPPORTED_FACTOR_THRESHOLD: f64 = 50.0;
const RECENT_SIGNALS_BONUS: f64 = 10.0;
const SOURCE_DIVERSITY_BONUS: f64 = 5.0;
const NEGATIVE_SIGNAL_PENALTY: f64 = -15.0;
const FUNDING_AND_HIRING_BONUS: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct AdjustedScore {
    pub score: u32,
    /// Human-readable description of each applied rule.
    pub applied: Vec<String>,
}

/// Apply the business rules to `base` and clamp to [0, 100].
///
/// - −8 for every factor scored above 50 whose signal has no source
/// - +10 when at least two signals have a recent source
/// - +5 when the evidence spans at least three source types
/// - −15 for every found negative signal
/// - +12 when both a funding and a hiring signal are found
pub fn adjust_score(
    base: f64,
    factors: &[ScoreFactor],
    signals: &[SignalResult],
    catalog: &SignalCatalog,
    now: DateTime<Utc>,
) -> AdjustedScore {
    let mut score = if base.is_finite() { base } else { 0.0 };
    let mut applied = Vec::new();

    let has_source = |signal_id: &str| {
        signals
            .iter()
            .any(|s| s.signal_id.eq_ignore_ascii_case(signal_id) && s.has_evidence())
    };

    for factor in factors {
        if factor.score > UNSUPPORTED_FACTOR_THRESHOLD && !has_source(&factor.signal) {
            score += UNSUPPORTED_FACTOR_PENALTY;
            applied.push(format!(
                "{} {} scored {} without sources",
                UNSUPPORTED_FACTOR_PENALTY, factor.signal, factor.score
            ));
        }
    }

    let recent_signals = signals
        .iter()
        .filter(|s| s.recent_count(now, RECENCY_WINDOW_DAYS) > 0)
        .count();
    if recent_signals >= 2 {
        score += RECENT_SIGNALS_BONUS;
        applied.push(format!("+{} {} signals with recent sources", RECENT_SIGNALS_BONUS, recent_signals));
    }

    let source_types: HashSet<String> = signals
        .iter()
        .flat_map(|s| s.evidence.iter())
        .map(|e| e.source_type.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if source_types.len() >= 3 {
        score += SOURCE_DIVERSITY_BONUS;
        applied.push(format!("+{} {} source types", SOURCE_DIVERSITY_BONUS, source_types.len()));
    }

    for signal in signals.iter().filter(|s| s.found && catalog.is_negative(&s.signal_id)) {
        score += NEGATIVE_SIGNAL_PENALTY;
        applied.push(format!("{} negative signal {}", NEGATIVE_SIGNAL_PENALTY, signal.signal_id));
    }

    let found_funding = signals.iter().any(|s| s.found && catalog.is_funding(&s.signal_id));
    let found_hiring = signals.iter().any(|s| s.found && catalog.is_hiring(&s.signal_id));
    if found_funding && found_hiring {
        score += FUNDING_AND_HIRING_BONUS;
        applied.push(format!("+{} funding and hiring together", FUNDING_AND_HIRING_BONUS));
    }

    let score = score.clamp(0.0, 100.0).round() as u32;
    debug!("Adjusted {} -> {} ({} rules)", base, score, applied.len());
    AdjustedScore { score, applied }
}
