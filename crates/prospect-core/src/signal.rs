//! Business signals and the evidence supporting them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A dated, sourced, confidence-scored excerpt supporting a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: String,
    #[serde(default)]
    pub url: String,
    /// Publication date as reported by the source (RFC 3339 or `YYYY-MM-DD`).
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub summary: String,
    /// Confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, rename = "sourceType", alias = "source_type")]
    pub source_type: String,
}

impl EvidenceItem {
    /// Parse the publication date, accepting RFC 3339 timestamps and plain dates.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Whether the item was published within `days` of `now`. Undated items are
    /// never recent.
    pub fn is_recent(&self, now: DateTime<Utc>, days: i64) -> bool {
        match self.published_at() {
            Some(ts) => now.signed_duration_since(ts).num_days() <= days,
            None => false,
        }
    }

    /// Confidence clamped to [0, 1].
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        }
    }
}

/// Outcome of detecting one business signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    #[serde(rename = "signalId", alias = "signal_id")]
    pub signal_id: String,
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub reasoning: String,
}

impl SignalResult {
    pub fn has_evidence(&self) -> bool {
        !self.evidence.is_empty()
    }

    /// Number of evidence items published within `days` of `now`.
    pub fn recent_count(&self, now: DateTime<Utc>, days: i64) -> usize {
        self.evidence.iter().filter(|e| e.is_recent(now, days)).count()
    }

    /// Mean confidence across evidence items, 0 when there are none.
    pub fn average_confidence(&self) -> f64 {
        if self.evidence.is_empty() {
            return 0.0;
        }
        let total: f64 = self.evidence.iter().map(|e| e.clamped_confidence()).sum();
        total / self.evidence.len() as f64
    }
}
