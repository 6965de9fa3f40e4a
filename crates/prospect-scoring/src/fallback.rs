//! Deterministic rule-based scoring used whenever the model path is skipped
//! or fails.

use prospect_core::SignalResult;

use crate::signals::SignalCatalog;
use crate::types::{
    timing_for, ConfidenceLevel, EvidenceQuality, ImpactLevel, IntentScore, ScoredSignal,
    ScoringPath, SignalAssessment,
};

const EVIDENCE_BONUS: f64 = 3.0;
const RECENCY_BONUS: f64 = 2.0;

/// Score from evidence alone.
///
/// The base is the weight-scaled sum of evidence scores over positive
/// signals. Each positive signal with evidence adds 3 points and each with
/// recent evidence adds 2 more. Negative signals never add to the score;
/// they surface as risk factors. `signals`, `weights` and `assessments` are
/// parallel slices.
pub fn fallback_score(
    signals: &[SignalResult],
    weights: &[u32],
    assessments: &[SignalAssessment],
    catalog: &SignalCatalog,
    reason: &str,
) -> IntentScore {
    let factors: Vec<ScoredSignal> = assessments
        .iter()
        .zip(weights)
        .map(|(a, &w)| ScoredSignal::new(a.signal_id.clone(), a.evidence_score as f64, w))
        .collect();

    let positive: Vec<bool> = assessments
        .iter()
        .map(|a| !catalog.is_negative(&a.signal_id))
        .collect();
    let base: f64 = factors
        .iter()
        .zip(&positive)
        .filter(|(_, p)| **p)
        .map(|(f, _)| f.weighted_contribution)
        .sum();
    let counted = || {
        assessments
            .iter()
            .zip(&positive)
            .filter(|(_, p)| **p)
            .map(|(a, _)| a)
    };
    let with_evidence = counted().filter(|a| a.source_count > 0).count();
    let with_recent = counted().filter(|a| a.recent_count > 0).count();
    let enhanced = base + EVIDENCE_BONUS * with_evidence as f64 + RECENCY_BONUS * with_recent as f64;
    let final_score = enhanced.clamp(0.0, 100.0).round() as u32;

    let total_sources: usize = assessments.iter().map(|a| a.source_count).sum();

    let mut insights = Vec::new();
    for a in assessments.iter().filter(|a| a.source_count > 0) {
        if catalog.is_negative(&a.signal_id) {
            continue;
        }
        let strength = match (a.impact, a.evidence_quality) {
            (ImpactLevel::High, _) | (_, EvidenceQuality::Strong) => "strong",
            (ImpactLevel::Medium, _) | (_, EvidenceQuality::Moderate) => "moderate",
            _ => "weak",
        };
        insights.push(format!(
            "{}: {} evidence from {} source(s), {} recent",
            a.signal_id, strength, a.source_count, a.recent_count
        ));
    }

    let mut risk_factors: Vec<String> = signals
        .iter()
        .filter(|s| s.found && catalog.is_negative(&s.signal_id))
        .map(|s| format!("Negative signal detected: {}", s.signal_id))
        .collect();
    if total_sources < 2 {
        risk_factors.push("Limited evidence: fewer than two sources".to_string());
    }

    IntentScore {
        final_score,
        confidence_level: ConfidenceLevel::from_source_count(total_sources),
        factors,
        insights,
        timing_recommendation: timing_for(final_score).to_string(),
        risk_factors,
        reasoning: format!(
            "Rule-based score from {} source(s) across {} signal(s) with evidence: {}",
            total_sources, with_evidence, reason
        ),
        path: ScoringPath::Fallback,
        assessments: assessments.to_vec(),
        adjustments: Vec::new(),
    }
}
