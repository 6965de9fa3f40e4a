//! Intent scoring engine.
//!
//! Flow: resolve input → check sufficiency → model or fallback path →
//! business-rule adjustment. Every failure is recovered here; callers always
//! receive an `IntentScore`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use prospect_core::SignalResult;
use prospect_llm::ScoringModel;

use crate::adjust::adjust_score;
use crate::evidence::assess;
use crate::fallback::fallback_score;
use crate::parse::{parse_model_output, validate_structured};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::signals::SignalCatalog;
use crate::types::{
    timing_for, ConfidenceLevel, IntentScore, ScoredSignal, ScoringInput, ScoringPath,
    SignalAssessment, SignalReport, StructuredScore,
};

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// A signal needs at least this evidence score for the model to be asked.
    pub min_sufficient_score: u32,
    /// Also run the business-rule adjuster on fallback scores.
    pub adjust_fallback: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_sufficient_score: 40,
            adjust_fallback: false,
        }
    }
}

/// Evidence-derived values shared by every path.
struct Prepared<'a> {
    signals: &'a [SignalResult],
    weights: Vec<u32>,
    assessments: Vec<SignalAssessment>,
}

pub struct IntentScoringEngine {
    model: Option<Arc<dyn ScoringModel>>,
    catalog: SignalCatalog,
    config: ScoringConfig,
}

impl IntentScoringEngine {
    pub fn new(model: Option<Arc<dyn ScoringModel>>) -> Self {
        Self {
            model,
            catalog: SignalCatalog::default(),
            config: ScoringConfig::default(),
        }
    }

    /// Engine without a model; every report takes the fallback path.
    pub fn rule_based() -> Self {
        Self::new(None)
    }

    pub fn with_catalog(mut self, catalog: SignalCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub async fn calculate_intent_score(&self, input: ScoringInput) -> IntentScore {
        self.calculate_intent_score_at(input, Utc::now()).await
    }

    /// Score relative to `now`, which anchors every recency check.
    pub async fn calculate_intent_score_at(
        &self,
        input: ScoringInput,
        now: DateTime<Utc>,
    ) -> IntentScore {
        let result = match input {
            ScoringInput::RawReport(report) => self.score_report(&report, now).await,
            ScoringInput::Structured(structured) => self.score_structured(structured, now),
            ScoringInput::Unusable(reason) => {
                warn!("{}", reason);
                IntentScore::unusable(reason)
            }
        };
        info!(
            "Intent score {} ({:?} path, confidence {:?})",
            result.final_score, result.path, result.confidence_level
        );
        result
    }

    fn prepare<'a>(&self, signals: &'a [SignalResult], now: DateTime<Utc>) -> Prepared<'a> {
        let ids: Vec<&str> = signals.iter().map(|s| s.signal_id.as_str()).collect();
        let weights = self.catalog.weights_for(&ids);
        let assessments = signals
            .iter()
            .map(|s| assess(s, self.catalog.importance(&s.signal_id).multiplier(), now))
            .collect();
        Prepared {
            signals,
            weights,
            assessments,
        }
    }

    fn is_sufficient(&self, prepared: &Prepared<'_>) -> bool {
        prepared
            .assessments
            .iter()
            .any(|a| a.source_count > 0 && a.evidence_score >= self.config.min_sufficient_score)
    }

    async fn score_report(&self, report: &SignalReport, now: DateTime<Utc>) -> IntentScore {
        if report.signals.is_empty() {
            return IntentScore::unusable("No signals to score");
        }
        let prepared = self.prepare(&report.signals, now);

        if !self.is_sufficient(&prepared) {
            debug!("Insufficient evidence for {}, skipping model", report.company_name);
            return self.fallback(&prepared, "insufficient evidence for model scoring", now);
        }

        let Some(model) = &self.model else {
            return self.fallback(&prepared, "no scoring model configured", now);
        };

        let prompt = build_prompt(&report.company_name, &report.signals, &prepared.assessments, now);
        let text = match model.generate(&prompt, SYSTEM_PROMPT).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Scoring model {} failed: {}", model.name(), e);
                return self.fallback(&prepared, &format!("scoring model unavailable ({})", e), now);
            }
        };

        match parse_model_output(&text) {
            Ok(structured) => self.finish(structured, &prepared, ScoringPath::Model, now),
            Err(e) => {
                warn!("Rejected output from {}: {}", model.name(), e);
                self.fallback(&prepared, &format!("malformed model output ({})", e), now)
            }
        }
    }

    fn score_structured(&self, structured: StructuredScore, now: DateTime<Utc>) -> IntentScore {
        let validated = serde_json::to_value(&structured)
            .map_err(|e| e.to_string())
            .and_then(|v| validate_structured(&v).map_err(|e| e.to_string()));

        let prepared = self.prepare(&structured.signals, now);
        match validated {
            Ok(valid) => self.finish(valid, &prepared, ScoringPath::Provided, now),
            Err(e) if !structured.signals.is_empty() => {
                warn!("Provided score rejected: {}", e);
                self.fallback(&prepared, &format!("provided score rejected ({})", e), now)
            }
            Err(e) => IntentScore::unusable(format!("Provided score rejected: {}", e)),
        }
    }

    /// Model or provided structured score, adjusted by business rules.
    fn finish(
        &self,
        structured: StructuredScore,
        prepared: &Prepared<'_>,
        path: ScoringPath,
        now: DateTime<Utc>,
    ) -> IntentScore {
        let factors: Vec<ScoredSignal> = prepared
            .assessments
            .iter()
            .zip(&prepared.weights)
            .map(|(a, &weight)| {
                let raw = structured
                    .factors
                    .iter()
                    .find(|f| f.signal.eq_ignore_ascii_case(&a.signal_id))
                    .map_or(a.evidence_score as f64, |f| f.score);
                ScoredSignal::new(a.signal_id.clone(), raw, weight)
            })
            .collect();

        let adjusted = adjust_score(
            structured.score,
            &structured.factors,
            prepared.signals,
            &self.catalog,
            now,
        );

        let total_sources: usize = prepared.assessments.iter().map(|a| a.source_count).sum();
        let confidence_level = structured
            .confidence
            .as_deref()
            .and_then(ConfidenceLevel::parse)
            .unwrap_or_else(|| ConfidenceLevel::from_source_count(total_sources));
        let timing_recommendation = structured
            .timing_recommendation
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| timing_for(adjusted.score).to_string());

        IntentScore {
            final_score: adjusted.score,
            confidence_level,
            factors,
            insights: structured.strategic_insights,
            timing_recommendation,
            risk_factors: structured.risk_factors,
            reasoning: structured.reason,
            path,
            assessments: prepared.assessments.clone(),
            adjustments: adjusted.applied,
        }
    }

    fn fallback(&self, prepared: &Prepared<'_>, reason: &str, now: DateTime<Utc>) -> IntentScore {
        let mut result = fallback_score(
            prepared.signals,
            &prepared.weights,
            &prepared.assessments,
            &self.catalog,
            reason,
        );
        if self.config.adjust_fallback {
            let adjusted = adjust_score(
                result.final_score as f64,
                &[],
                prepared.signals,
                &self.catalog,
                now,
            );
            result.final_score = adjusted.score;
            result.timing_recommendation = timing_for(adjusted.score).to_string();
            result.adjustments = adjusted.applied;
        }
        result
    }
}
