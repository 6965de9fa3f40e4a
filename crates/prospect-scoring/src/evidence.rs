//! Per-signal evidence scoring.

use chrono::{DateTime, Utc};

use prospect_core::SignalResult;

use crate::types::{EvidenceQuality, ImpactLevel, SignalAssessment};

/// Evidence published within this many days counts as recent.
pub const RECENCY_WINDOW_DAYS: i64 = 90;

const BASE_POINTS: f64 = 30.0;
const CONFIDENCE_POINTS: f64 = 15.0;

fn quantity_bonus(count: usize) -> f64 {
    match count {
        5.. => 25.0,
        3..=4 => 20.0,
        1..=2 => 15.0,
        _ => 0.0,
    }
}

fn recency_bonus(recent: usize) -> f64 {
    match recent {
        3.. => 20.0,
        1..=2 => 10.0,
        _ => 0.0,
    }
}

/// Score one signal's evidence in [0, 100]. A signal without evidence scores 0.
///
/// 30 base points, a quantity bonus, a recency bonus and up to 15 points for
/// average confidence, multiplied by the signal's importance multiplier,
/// rounded and clamped.
pub fn evidence_score(signal: &SignalResult, multiplier: f64, now: DateTime<Utc>) -> u32 {
    if !signal.has_evidence() {
        return 0;
    }
    let recent = signal.recent_count(now, RECENCY_WINDOW_DAYS);
    let points = BASE_POINTS
        + quantity_bonus(signal.evidence.len())
        + recency_bonus(recent)
        + signal.average_confidence() * CONFIDENCE_POINTS;
    (points * multiplier).round().clamp(0.0, 100.0) as u32
}

/// Evidence summary and labels for one signal.
pub fn assess(signal: &SignalResult, multiplier: f64, now: DateTime<Utc>) -> SignalAssessment {
    let mut assessment = SignalAssessment {
        signal_id: signal.signal_id.clone(),
        evidence_score: evidence_score(signal, multiplier, now),
        source_count: signal.evidence.len(),
        recent_count: signal.recent_count(now, RECENCY_WINDOW_DAYS),
        average_confidence: signal.average_confidence(),
        impact: ImpactLevel::Low,
        evidence_quality: EvidenceQuality::None,
    };
    assessment.label();
    assessment
}
