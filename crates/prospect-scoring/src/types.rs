//! Scoring inputs and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prospect_core::SignalResult;

/// Detected signals for one account, as produced by signal detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalReport {
    #[serde(default, alias = "companyName")]
    pub company_name: String,
    #[serde(default)]
    pub signals: Vec<SignalResult>,
    #[serde(default, alias = "generatedAt", skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// One per-signal score inside a structured answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFactor {
    pub signal: String,
    pub score: f64,
    #[serde(default)]
    pub explanation: String,
}

/// A structured intent score, as answered by the scoring model or supplied
/// by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredScore {
    pub score: f64,
    /// Missing reason or factors deserialize empty and are rejected by
    /// validation.
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub factors: Vec<ScoreFactor>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub strategic_insights: Vec<String>,
    #[serde(default)]
    pub timing_recommendation: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Evidence backing a caller-supplied score. Model answers leave this empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<SignalResult>,
}

/// Input shapes accepted by the engine, resolved once at the entry point.
#[derive(Debug, Clone)]
pub enum ScoringInput {
    RawReport(SignalReport),
    Structured(StructuredScore),
    /// A document matching neither shape. Scores zero.
    Unusable(String),
}

impl ScoringInput {
    /// Resolve a JSON document into an input shape. A top-level `score`
    /// marks a structured score; otherwise the document is read as a report.
    /// Never fails: documents that fit neither shape resolve to `Unusable`.
    pub fn from_json(value: serde_json::Value) -> Self {
        let resolved = if value.get("score").is_some() {
            serde_json::from_value(value).map(ScoringInput::Structured)
        } else {
            serde_json::from_value(value).map(ScoringInput::RawReport)
        };
        resolved.unwrap_or_else(|e| ScoringInput::Unusable(format!("Unrecognized scoring input: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Bucket by total number of evidence sources.
    pub fn from_source_count(count: usize) -> Self {
        match count {
            8.. => Self::VeryHigh,
            5..=7 => Self::High,
            2..=4 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "very-high" => Some(Self::VeryHigh),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// How the final score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPath {
    Model,
    Provided,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceQuality {
    Strong,
    Moderate,
    Weak,
    None,
}

/// Per-signal evidence summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalAssessment {
    pub signal_id: String,
    pub evidence_score: u32,
    pub source_count: usize,
    pub recent_count: usize,
    pub average_confidence: f64,
    pub impact: ImpactLevel,
    pub evidence_quality: EvidenceQuality,
}

impl SignalAssessment {
    /// Labels from fixed thresholds on source count, confidence and recency.
    pub fn label(&mut self) {
        self.impact = if self.source_count >= 3 && self.average_confidence >= 0.7 {
            ImpactLevel::High
        } else if self.source_count >= 1 && self.average_confidence >= 0.5 {
            ImpactLevel::Medium
        } else {
            ImpactLevel::Low
        };
        self.evidence_quality = if self.source_count >= 3 && self.recent_count >= 2 {
            EvidenceQuality::Strong
        } else if self.source_count >= 2 || self.recent_count >= 1 {
            EvidenceQuality::Moderate
        } else if self.source_count == 1 {
            EvidenceQuality::Weak
        } else {
            EvidenceQuality::None
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredSignal {
    pub signal_id: String,
    pub raw_score: f64,
    pub weight: u32,
    pub weighted_contribution: f64,
}

impl ScoredSignal {
    pub fn new(signal_id: impl Into<String>, raw_score: f64, weight: u32) -> Self {
        let raw_score = raw_score.clamp(0.0, 100.0);
        Self {
            signal_id: signal_id.into(),
            raw_score,
            weight,
            weighted_contribution: raw_score * weight as f64 / 100.0,
        }
    }
}

/// Final intent score. Replaced wholesale by the next run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentScore {
    pub final_score: u32,
    pub confidence_level: ConfidenceLevel,
    pub factors: Vec<ScoredSignal>,
    pub insights: Vec<String>,
    pub timing_recommendation: String,
    pub risk_factors: Vec<String>,
    pub reasoning: String,
    pub path: ScoringPath,
    #[serde(default)]
    pub assessments: Vec<SignalAssessment>,
    #[serde(default)]
    pub adjustments: Vec<String>,
}

impl IntentScore {
    /// A zero score for input that cannot be scored at all.
    pub fn unusable(reason: impl Into<String>) -> Self {
        Self {
            final_score: 0,
            confidence_level: ConfidenceLevel::Low,
            factors: Vec::new(),
            insights: Vec::new(),
            timing_recommendation: timing_for(0).to_string(),
            risk_factors: vec!["No usable signal data".to_string()],
            reasoning: reason.into(),
            path: ScoringPath::Fallback,
            assessments: Vec::new(),
            adjustments: Vec::new(),
        }
    }
}

/// Default timing advice by score band.
pub fn timing_for(score: u32) -> &'static str {
    match score {
        80.. => "Engage immediately: strong, recent buying signals",
        60..=79 => "Engage within the next two weeks",
        40..=59 => "Nurture and re-check signals within 30 days",
        _ => "Monitor; not enough intent to prioritize outreach",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(ConfidenceLevel::from_source_count(9), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_source_count(8), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_source_count(5), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_source_count(2), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_source_count(1), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::parse("Very High"), Some(ConfidenceLevel::VeryHigh));
        assert_eq!(ConfidenceLevel::parse("very_high"), Some(ConfidenceLevel::VeryHigh));
        assert_eq!(ConfidenceLevel::parse("certain"), None);
    }

    #[test]
    fn test_input_shape_resolution() {
        let report = json!({"companyName": "Acme", "signals": []});
        assert!(matches!(
            ScoringInput::from_json(report),
            ScoringInput::RawReport(r) if r.company_name == "Acme"
        ));

        let structured = json!({"score": 70, "reason": "ok", "factors": []});
        assert!(matches!(
            ScoringInput::from_json(structured),
            ScoringInput::Structured(s) if s.score == 70.0
        ));
    }

    #[test]
    fn test_incomplete_inputs_still_resolve() {
        let no_reason = json!({"score": 70, "factors": []});
        assert!(matches!(
            ScoringInput::from_json(no_reason),
            ScoringInput::Structured(s) if s.reason.is_empty()
        ));

        let no_signal_id = json!({"signals": [{"found": true}]});
        assert!(matches!(
            ScoringInput::from_json(no_signal_id),
            ScoringInput::Unusable(reason) if reason.contains("signalId")
        ));

        let bad_score = json!({"score": "high", "reason": "x"});
        assert!(matches!(ScoringInput::from_json(bad_score), ScoringInput::Unusable(_)));
    }

    #[test]
    fn test_assessment_labels() {
        let mut a = SignalAssessment {
            signal_id: "funding".into(),
            evidence_score: 80,
            source_count: 4,
            recent_count: 2,
            average_confidence: 0.8,
            impact: ImpactLevel::Low,
            evidence_quality: EvidenceQuality::None,
        };
        a.label();
        assert_eq!(a.impact, ImpactLevel::High);
        assert_eq!(a.evidence_quality, EvidenceQuality::Strong);

        a.source_count = 1;
        a.recent_count = 0;
        a.average_confidence = 0.4;
        a.label();
        assert_eq!(a.impact, ImpactLevel::Low);
        assert_eq!(a.evidence_quality, EvidenceQuality::Weak);
    }

    #[test]
    fn test_scored_signal_contribution() {
        let s = ScoredSignal::new("hiring", 80.0, 25);
        assert_eq!(s.weighted_contribution, 20.0);
        assert_eq!(ScoredSignal::new("x", 140.0, 10).raw_score, 100.0);
    }
}
