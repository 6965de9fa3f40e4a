//! Entity records exchanged with the entity store.
//!
//! Provider payloads are heterogeneous, so an entity keeps its raw fields as a
//! JSON map; only the embedding field contract is typed.

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Kind of entity, selects the canonicalization template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Company,
    Employee,
    Enrichment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Employee => "employee",
            Self::Enrichment => "enrichment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "company" | "companies" => Some(Self::Company),
            "employee" | "person" | "people" => Some(Self::Employee),
            "enrichment" => Some(Self::Enrichment),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored entity and its embedding fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub kind: EntityKind,
    /// Identifier assigned by the data provider, used for exclusion filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Raw provider fields.
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    pub embedding: Option<Array1<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub search_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            external_id: None,
            fields: serde_json::Map::new(),
            embedding: None,
            embedding_text: None,
            embedding_generated_at: None,
            search_keywords: Vec::new(),
            semantic_summary: None,
            created_at: Utc::now(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Render a field as display text. Arrays are space-joined; missing or
    /// null fields render as an empty string.
    pub fn field_text(&self, key: &str) -> String {
        self.fields.get(key).map(value_text).unwrap_or_default()
    }

    /// First non-empty rendering among several candidate keys.
    pub fn first_field_text(&self, keys: &[&str]) -> String {
        keys.iter()
            .map(|k| self.field_text(k))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        serde_json::Value::Object(map) => {
            // Nested objects like {"name": "Berlin"} render their name.
            map.get("name").map(value_text).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_text_variants() {
        let entity = EntityRecord::new("e1", EntityKind::Company)
            .with_field("name", "Acme")
            .with_field("technologies", json!(["rust", "postgres"]))
            .with_field("employees", 120)
            .with_field("location", json!({"name": "Berlin"}))
            .with_field("industry", serde_json::Value::Null);

        assert_eq!(entity.field_text("name"), "Acme");
        assert_eq!(entity.field_text("technologies"), "rust postgres");
        assert_eq!(entity.field_text("employees"), "120");
        assert_eq!(entity.field_text("location"), "Berlin");
        assert_eq!(entity.field_text("industry"), "");
        assert_eq!(entity.field_text("missing"), "");
    }

    #[test]
    fn test_first_field_text() {
        let entity = EntityRecord::new("e2", EntityKind::Employee).with_field("role", "CTO");
        assert_eq!(entity.first_field_text(&["title", "role"]), "CTO");
        assert_eq!(entity.first_field_text(&["title"]), "");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(EntityKind::parse("People"), Some(EntityKind::Employee));
        assert_eq!(EntityKind::parse("company"), Some(EntityKind::Company));
        assert_eq!(EntityKind::parse("article"), None);
    }
}
