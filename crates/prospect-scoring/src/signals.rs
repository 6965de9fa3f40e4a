//! Business signal catalog: importance, polarity, detection keywords and
//! weights.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::weights::normalize_weights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Default,
}

impl Importance {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::High => 1.3,
            Self::Medium => 1.1,
            Self::Default => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDefinition {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub polarity: Polarity,
    /// Relative weight before normalization.
    pub raw_weight: f64,
    pub keywords: Vec<String>,
}

impl SignalDefinition {
    fn new(
        id: &str,
        name: &str,
        importance: Importance,
        polarity: Polarity,
        raw_weight: f64,
        keywords: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            importance,
            polarity,
            raw_weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Raw weight for signals that are not in the catalog.
pub const DEFAULT_RAW_WEIGHT: f64 = 10.0;

static NEGATIVE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)layoff|lay[-_ ]off|cost[-_ ]?cut|decrease|declin|downsiz|restructur|hiring[-_ ]?freeze")
        .expect("static regex")
});
static FUNDING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)fund|raise|investment|series[-_ ]?[a-e]\b").expect("static regex")
});
static HIRING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)hiring|hire|recruit|headcount[-_ ]?growth").expect("static regex")
});
static HIRING_FREEZE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)hiring[-_ ]?(freeze|pause)|(freez|froze|paus|halt|suspend)(e|es|ed|ing|n)? (all )?(hiring|recruiting)")
        .expect("static regex")
});

/// `text` with hiring-freeze phrasing blanked out, so it cannot satisfy a
/// hiring keyword.
pub fn strip_hiring_freeze(text: &str) -> std::borrow::Cow<'_, str> {
    HIRING_FREEZE_TEXT.replace_all(text, " ")
}

/// Known signals. Lookups by id are case-insensitive.
#[derive(Debug, Clone)]
pub struct SignalCatalog {
    signals: Vec<SignalDefinition>,
}

impl Default for SignalCatalog {
    fn default() -> Self {
        use Importance::*;
        use Polarity::*;
        Self::new(vec![
            SignalDefinition::new(
                "funding_round",
                "Funding round",
                High,
                Positive,
                20.0,
                &["raised", "funding", "series a", "series b", "series c", "investment", "investors"],
            ),
            SignalDefinition::new(
                "hiring_spree",
                "Hiring spree",
                High,
                Positive,
                18.0,
                &["hiring", "job openings", "we are hiring", "recruiting", "open roles", "headcount"],
            ),
            SignalDefinition::new(
                "leadership_change",
                "Leadership change",
                Medium,
                Positive,
                12.0,
                &["appointed", "new ceo", "new cto", "joins as", "named chief", "promoted to"],
            ),
            SignalDefinition::new(
                "product_launch",
                "Product launch",
                Medium,
                Positive,
                10.0,
                &["launch", "launches", "unveils", "introduces", "new product", "release"],
            ),
            SignalDefinition::new(
                "expansion",
                "Expansion",
                Medium,
                Positive,
                12.0,
                &["expands", "expansion", "new office", "opens", "new market", "international"],
            ),
            SignalDefinition::new(
                "technology_adoption",
                "Technology adoption",
                Default,
                Positive,
                10.0,
                &["migrat", "adopts", "implements", "rollout", "modernization", "digital transformation"],
            ),
            SignalDefinition::new(
                "partnership",
                "Partnership",
                Default,
                Positive,
                8.0,
                &["partnership", "partners with", "alliance", "integration with", "collaboration"],
            ),
            SignalDefinition::new(
                "layoffs",
                "Layoffs",
                High,
                Negative,
                5.0,
                &["layoff", "layoffs", "laid off", "job cuts", "workforce reduction"],
            ),
            SignalDefinition::new(
                "cost_cutting",
                "Cost cutting",
                Medium,
                Negative,
                5.0,
                &["cost cutting", "cost-cutting", "budget cuts", "spending freeze", "hiring freeze", "restructuring"],
            ),
        ])
    }
}

impl SignalCatalog {
    pub fn new(signals: Vec<SignalDefinition>) -> Self {
        Self { signals }
    }

    pub fn signals(&self) -> &[SignalDefinition] {
        &self.signals
    }

    pub fn get(&self, id: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    pub fn importance(&self, id: &str) -> Importance {
        self.get(id).map_or(Importance::Default, |s| s.importance)
    }

    /// Weights over `ids` summing to 100. Unknown ids get the default raw
    /// weight before normalization.
    pub fn weights_for(&self, ids: &[&str]) -> Vec<u32> {
        let raw: Vec<f64> = ids
            .iter()
            .map(|id| self.get(id).map_or(DEFAULT_RAW_WEIGHT, |s| s.raw_weight))
            .collect();
        normalize_weights(&raw)
    }

    /// Negative signals: catalog polarity, or a layoff / cost-cutting /
    /// decrease pattern in the id.
    pub fn is_negative(&self, id: &str) -> bool {
        match self.get(id) {
            Some(def) if def.polarity == Polarity::Negative => true,
            _ => NEGATIVE_PATTERN.is_match(id),
        }
    }

    pub fn is_funding(&self, id: &str) -> bool {
        !self.is_negative(id) && FUNDING_PATTERN.is_match(id)
    }

    pub fn is_hiring(&self, id: &str) -> bool {
        !self.is_negative(id) && HIRING_PATTERN.is_match(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum() {
        let catalog = SignalCatalog::default();
        let ids: Vec<&str> = catalog.signals().iter().map(|s| s.id.as_str()).collect();
        let weights = catalog.weights_for(&ids);
        assert_eq!(weights.iter().sum::<u32>(), 100);
        assert_eq!(weights[0], 20);
    }

    #[test]
    fn test_unknown_signals_get_default_weight() {
        let catalog = SignalCatalog::default();
        assert_eq!(catalog.weights_for(&["mystery_a", "mystery_b"]), vec![50, 50]);
        assert_eq!(catalog.importance("mystery_a"), Importance::Default);
        assert_eq!(catalog.importance("FUNDING_ROUND"), Importance::High);
    }

    #[test]
    fn test_classification() {
        let catalog = SignalCatalog::default();
        assert!(catalog.is_negative("layoffs"));
        assert!(catalog.is_negative("cost_cutting"));
        assert!(catalog.is_negative("revenue_decrease"));
        assert!(!catalog.is_negative("funding_round"));

        assert!(catalog.is_funding("funding_round"));
        assert!(catalog.is_funding("recent_series_b"));
        assert!(catalog.is_hiring("hiring_spree"));
        assert!(catalog.is_hiring("engineering_recruiting"));
        assert!(!catalog.is_hiring("hiring_freeze"));
        assert!(!catalog.is_funding("product_launch"));
    }

    #[test]
    fn test_strip_hiring_freeze() {
        assert_eq!(strip_hiring_freeze("acme is hiring").as_ref(), "acme is hiring");
        for text in ["announced a hiring freeze", "acme froze hiring", "acme paused recruiting"] {
            assert!(!strip_hiring_freeze(text).contains("hiring"), "{}", text);
            assert!(!strip_hiring_freeze(text).contains("recruiting"), "{}", text);
        }
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(Importance::High.multiplier(), 1.3);
        assert_eq!(Importance::Medium.multiplier(), 1.1);
        assert_eq!(Importance::Default.multiplier(), 1.0);
    }
}
