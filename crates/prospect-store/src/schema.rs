//! Database schema SQL.

/// Entities and their embedding fields.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    external_id TEXT,
    fields_json TEXT NOT NULL,
    search_keywords_json TEXT,
    semantic_summary TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);
CREATE INDEX IF NOT EXISTS idx_entities_external ON entities(kind, external_id);

CREATE TABLE IF NOT EXISTS entity_embeddings (
    entity_id TEXT PRIMARY KEY REFERENCES entities(id) ON DELETE CASCADE,
    embedding BLOB NOT NULL,
    embedding_text TEXT NOT NULL,
    source TEXT NOT NULL,
    generated_at INTEGER NOT NULL
);
"#;
