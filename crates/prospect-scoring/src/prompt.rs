//! Scoring prompt construction.

use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use prospect_core::SignalResult;

use crate::evidence::RECENCY_WINDOW_DAYS;
use crate::types::SignalAssessment;

/// Evidence excerpts shown per signal.
const MAX_EXCERPTS: usize = 3;
const EXCERPT_CHARS: usize = 200;

pub const SYSTEM_PROMPT: &str = "You are a B2B sales intelligence analyst. You score how likely \
a company is to buy in the near term from detected business signals and their evidence. \
Respond with a single JSON object and nothing else.";

const RESPONSE_FORMAT: &str = r#"{
  "score": <integer 0-100>,
  "reason": "<one paragraph>",
  "factors": [{"signal": "<signal id>", "score": <integer 0-100>, "explanation": "<why>"}],
  "confidence": "very-high" | "high" | "medium" | "low",
  "strategic_insights": ["<insight>"],
  "timing_recommendation": "<when to engage>",
  "risk_factors": ["<risk>"]
}"#;

/// Build the user prompt from every signal's evidence score, excerpts,
/// source-type diversity and recency.
pub fn build_prompt(
    company_name: &str,
    signals: &[SignalResult],
    assessments: &[SignalAssessment],
    now: DateTime<Utc>,
) -> String {
    let company = if company_name.trim().is_empty() {
        "the target company"
    } else {
        company_name.trim()
    };

    let source_types: BTreeSet<&str> = signals
        .iter()
        .flat_map(|s| s.evidence.iter())
        .map(|e| e.source_type.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    let total_sources: usize = signals.iter().map(|s| s.evidence.len()).sum();

    let mut out = String::new();
    let _ = writeln!(out, "Assess buying intent for {}.", company);
    let _ = writeln!(
        out,
        "Evidence: {} sources across {} source types ({}). Recent means within {} days.",
        total_sources,
        source_types.len(),
        source_types.iter().copied().collect::<Vec<_>>().join(", "),
        RECENCY_WINDOW_DAYS
    );
    let _ = writeln!(out, "\nSignals:");

    for (signal, assessment) in signals.iter().zip(assessments) {
        let _ = writeln!(
            out,
            "\n- {} (found: {}, evidence score: {}/100, sources: {}, recent: {}, avg confidence: {:.2})",
            signal.signal_id,
            signal.found,
            assessment.evidence_score,
            assessment.source_count,
            assessment.recent_count,
            assessment.average_confidence
        );
        if !signal.reasoning.is_empty() {
            let _ = writeln!(out, "  Detection notes: {}", signal.reasoning);
        }
        for item in signal.evidence.iter().take(MAX_EXCERPTS) {
            let excerpt: String = item.summary.chars().take(EXCERPT_CHARS).collect();
            let recency = if item.is_recent(now, RECENCY_WINDOW_DAYS) {
                "recent"
            } else {
                "older"
            };
            let _ = writeln!(
                out,
                "  * [{} | {} | {}] {}",
                item.source,
                item.date.as_deref().unwrap_or("undated"),
                recency,
                excerpt
            );
        }
    }

    let _ = writeln!(
        out,
        "\nScore every signal above as a factor. Answer with JSON in exactly this format:\n{}",
        RESPONSE_FORMAT
    );
    out
}
