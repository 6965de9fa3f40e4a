//! Extraction and validation of the model's JSON answer.

use serde_json::Value;

use crate::error::ScoringError;
use crate::types::{ScoreFactor, StructuredScore};

/// The first balanced `{...}` object in `text`, ignoring braces inside
/// JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn check_range(field: String, value: f64) -> Result<f64, ScoringError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(ScoringError::OutOfRange { field, value })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Validate a JSON value field by field.
pub fn validate_structured(value: &Value) -> Result<StructuredScore, ScoringError> {
    let score = value
        .get("score")
        .and_then(|v| v.as_f64())
        .ok_or(ScoringError::MissingField("score"))?;
    let score = check_range("score".into(), score)?;

    let reason = value
        .get("reason")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(ScoringError::MissingField("reason"))?
        .to_string();

    let raw_factors = value
        .get("factors")
        .and_then(|v| v.as_array())
        .ok_or(ScoringError::MissingField("factors"))?;

    let mut factors = Vec::with_capacity(raw_factors.len());
    for (index, f) in raw_factors.iter().enumerate() {
        let signal = f
            .get("signal")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScoringError::InvalidFactor {
                index,
                reason: "missing signal".into(),
            })?;
        let factor_score = f
            .get("score")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ScoringError::InvalidFactor {
                index,
                reason: "missing score".into(),
            })?;
        let factor_score = check_range(format!("factors[{}].score", index), factor_score)?;
        factors.push(ScoreFactor {
            signal: signal.to_string(),
            score: factor_score,
            explanation: f
                .get("explanation")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(StructuredScore {
        score,
        reason,
        factors,
        confidence: value
            .get("confidence")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        strategic_insights: string_list(value.get("strategic_insights")),
        timing_recommendation: value
            .get("timing_recommendation")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        risk_factors: string_list(value.get("risk_factors")),
        signals: Vec::new(),
    })
}

/// Parse the model's text answer. No re-prompting: any problem is an error.
pub fn parse_model_output(text: &str) -> Result<StructuredScore, ScoringError> {
    let json = extract_json_object(text).ok_or(ScoringError::NoJsonObject)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| ScoringError::InvalidJson(e.to_string()))?;
    validate_structured(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"Here is my assessment:
```json
{"score": 72, "reason": "Recent funding {and} hiring", "factors": [
  {"signal": "funding_round", "score": 85, "explanation": "Series B \"closed\""},
  {"signal": "hiring_spree", "score": 60}
], "confidence": "high", "strategic_insights": ["Budget unlocked"],
"timing_recommendation": "Engage now", "risk_factors": []}
```
Let me know if you need more."#;

    #[test]
    fn test_extracts_first_object_with_braces_in_strings() {
        let json = extract_json_object(GOOD).unwrap();
        assert!(json.starts_with("{\"score\": 72"));
        assert!(json.ends_with("\"risk_factors\": []}"));
        assert_eq!(extract_json_object("{\"a\": {\"b\": 1}} {\"c\": 2}"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"unterminated\": 1"), None);
    }

    #[test]
    fn test_parses_valid_answer() {
        let parsed = parse_model_output(GOOD).unwrap();
        assert_eq!(parsed.score, 72.0);
        assert_eq!(parsed.factors.len(), 2);
        assert_eq!(parsed.factors[0].explanation, "Series B \"closed\"");
        assert_eq!(parsed.factors[1].explanation, "");
        assert_eq!(parsed.confidence.as_deref(), Some("high"));
        assert_eq!(parsed.strategic_insights, vec!["Budget unlocked"]);
    }

    #[test]
    fn test_rejects_invalid_answers() {
        assert!(matches!(
            parse_model_output("I cannot help"),
            Err(ScoringError::NoJsonObject)
        ));
        assert!(matches!(
            parse_model_output("{score: 70}"),
            Err(ScoringError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_model_output(r#"{"score": 140, "reason": "x", "factors": []}"#),
            Err(ScoringError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_model_output(r#"{"score": 70, "reason": "  ", "factors": []}"#),
            Err(ScoringError::MissingField("reason"))
        ));
        assert!(matches!(
            parse_model_output(r#"{"score": 70, "reason": "x", "factors": {}}"#),
            Err(ScoringError::MissingField("factors"))
        ));
        assert!(matches!(
            parse_model_output(r#"{"score": 70, "reason": "x", "factors": [{"signal": "", "score": 10}]}"#),
            Err(ScoringError::InvalidFactor { index: 0, .. })
        ));
        assert!(matches!(
            parse_model_output(r#"{"score": 70, "reason": "x", "factors": [{"signal": "a", "score": -1}]}"#),
            Err(ScoringError::OutOfRange { field, .. }) if field == "factors[0].score"
        ));
    }
}
