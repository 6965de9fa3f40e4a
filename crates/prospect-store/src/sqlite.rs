//! SQLite-backed entity store with cosine vector search.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{decode_f32, encode_f32};
use crate::schema::SCHEMA_SQL;
use crate::traits::EntityStore;
use crate::types::*;
use prospect_core::{EntityKind, EntityRecord, Error, Result};

/// SQLite store for entities and their embeddings.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    /// Normalized embedding matrix for vector search: (N, dim) float32.
    index: Mutex<EmbeddingIndex>,
}

struct EmbeddingIndex {
    matrix: Array2<f32>,
    entity_ids: Vec<String>,
    kinds: Vec<EntityKind>,
    /// Whether the matrix needs reloading.
    dirty: bool,
}

const ENTITY_COLUMNS: &str = "e.id, e.kind, e.external_id, e.fields_json, e.search_keywords_json, \
     e.semantic_summary, e.created_at, ee.embedding, ee.embedding_text, ee.generated_at";

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

impl SqliteStore {
    /// Open or create the store. The file will be `db_dir/prospect.db`.
    pub fn open(db_dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("prospect.db");

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            index: Mutex::new(EmbeddingIndex {
                matrix: Array2::zeros((0, embedding_dim)),
                entity_ids: Vec::new(),
                kinds: Vec::new(),
                dirty: true,
            }),
        };

        let stats = store.get_stats()?;
        info!(
            "SqliteStore initialized: {} entities, {} embeddings, dim={}, path={}",
            stats.total_entities,
            stats.embeddings_stored,
            embedding_dim,
            store.db_path.display()
        );

        Ok(store)
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Delete an entity and its embedding.
    pub fn delete_entity(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM entities WHERE id = ?1", params![id])
            .map_err(db_err)?;
        drop(conn);
        if count > 0 {
            self.index.lock().dirty = true;
        }
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------

    fn load_index(&self) -> Result<()> {
        let mut ids = Vec::new();
        let mut kinds = Vec::new();
        let mut vectors: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT ee.entity_id, e.kind, ee.embedding \
                     FROM entity_embeddings ee JOIN entities e ON e.id = ee.entity_id",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })
                .map_err(db_err)?;

            for row in rows {
                let (id, kind, blob) = row.map_err(db_err)?;
                let vector = decode_f32(&blob)?;
                if vector.len() != self.embedding_dim {
                    debug!("Skipping embedding for {} with dim={}", id, vector.len());
                    continue;
                }
                let Some(kind) = EntityKind::parse(&kind) else {
                    continue;
                };
                ids.push(id);
                kinds.push(kind);
                vectors.push(vector);
            }
        }

        let mut matrix = Array2::zeros((vectors.len(), self.embedding_dim));
        for (i, v) in vectors.iter().enumerate() {
            let norm = v.dot(v).sqrt();
            if norm > 1e-9 {
                matrix.row_mut(i).assign(&(v / norm));
            }
        }

        let mut index = self.index.lock();
        index.matrix = matrix;
        index.entity_ids = ids;
        index.kinds = kinds;
        index.dirty = false;
        debug!("Embedding index loaded: {} rows", index.entity_ids.len());
        Ok(())
    }

    /// Cosine similarity search over stored embeddings.
    pub fn find_similar(
        &self,
        query: &Array1<f32>,
        kind: Option<EntityKind>,
        top_k: usize,
    ) -> Result<Vec<SimilarEntity>> {
        if query.len() != self.embedding_dim {
            return Err(Error::Storage(format!(
                "Query dimension {} does not match store dimension {}",
                query.len(),
                self.embedding_dim
            )));
        }
        if self.index.lock().dirty {
            self.load_index()?;
        }

        let q_norm = query.dot(query).sqrt();
        if q_norm < 1e-9 {
            return Ok(Vec::new());
        }
        let q = query / q_norm;

        let index = self.index.lock();
        if index.matrix.nrows() == 0 {
            return Ok(Vec::new());
        }
        let similarities = index.matrix.dot(&q);

        let mut scored: Vec<(usize, f32)> = similarities
            .iter()
            .enumerate()
            .filter(|(i, _)| kind.map_or(true, |k| index.kinds[*i] == k))
            .map(|(i, &s)| (i, s))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, s)| SimilarEntity {
                entity_id: index.entity_ids[i].clone(),
                kind: index.kinds[i],
                score: s as f64,
            })
            .collect())
    }

    /// Entities whose stored keywords contain any of `keywords`, ranked by
    /// number of matches.
    pub fn search_by_keywords(
        &self,
        keywords: &[String],
        kind: Option<EntityKind>,
        limit: usize,
    ) -> Result<Vec<(String, usize)>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, kind, search_keywords_json FROM entities \
                 WHERE search_keywords_json IS NOT NULL",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_err)?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, row_kind, json) = row.map_err(db_err)?;
            if kind.is_some_and(|k| k.as_str() != row_kind) {
                continue;
            }
            let stored: Vec<String> = serde_json::from_str(&json).unwrap_or_default();
            let matches = keywords.iter().filter(|k| stored.contains(k)).count();
            if matches > 0 {
                hits.push((id, matches));
            }
        }
        hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<i64> {
            conn.query_row(sql, [], |row| row.get(0)).map_err(db_err)
        };
        Ok(StoreStats {
            total_entities: count("SELECT COUNT(*) FROM entities")?,
            embeddings_stored: count("SELECT COUNT(*) FROM entity_embeddings")?,
            fallback_embeddings: count(
                "SELECT COUNT(*) FROM entity_embeddings WHERE source = 'fallback'",
            )?,
            embedding_dimension: self.embedding_dim,
            db_path: self.db_path.display().to_string(),
        })
    }

    fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<(EntityRecord, Option<Vec<u8>>)> {
        let kind: String = row.get(1)?;
        let fields_json: String = row.get(3)?;
        let keywords_json: Option<String> = row.get(4)?;
        let generated_at: Option<i64> = row.get(9)?;

        let mut entity = EntityRecord::new(
            row.get::<_, String>(0)?,
            EntityKind::parse(&kind).unwrap_or(EntityKind::Company),
        );
        entity.external_id = row.get(2)?;
        entity.fields = serde_json::from_str(&fields_json).unwrap_or_default();
        entity.search_keywords = keywords_json
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        entity.semantic_summary = row.get(5)?;
        entity.created_at = from_millis(row.get(6)?);
        entity.embedding_text = row.get(8)?;
        entity.embedding_generated_at = generated_at.map(from_millis);
        Ok((entity, row.get(7)?))
    }
}

impl EntityStore for SqliteStore {
    fn put_entity(&self, entity: &EntityRecord) -> Result<()> {
        let fields_json = serde_json::to_string(&entity.fields)?;
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO entities (id, kind, external_id, fields_json, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(id) DO UPDATE SET kind = excluded.kind, \
             external_id = excluded.external_id, fields_json = excluded.fields_json, \
             updated_at = ?6",
        )
        .map_err(db_err)?
        .execute(params![
            entity.id,
            entity.kind.as_str(),
            entity.external_id,
            fields_json,
            entity.created_at.timestamp_millis(),
            now_millis(),
        ])
        .map_err(db_err)?;
        Ok(())
    }

    fn get_entity(&self, id: &str) -> Result<Option<EntityRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM entities e LEFT JOIN entity_embeddings ee ON ee.entity_id = e.id \
             WHERE e.id = ?1",
            ENTITY_COLUMNS
        );
        let row = conn
            .prepare_cached(&sql)
            .map_err(db_err)?
            .query_row(params![id], Self::row_to_entity)
            .optional()
            .map_err(db_err)?;
        drop(conn);

        match row {
            Some((mut entity, blob)) => {
                entity.embedding = blob.as_deref().map(decode_f32).transpose()?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    fn write_embedding(&self, id: &str, update: &EmbeddingUpdate) -> Result<bool> {
        let keywords_json = update
            .search_keywords
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let updated = tx
            .execute(
                "UPDATE entities SET \
                 search_keywords_json = COALESCE(?1, search_keywords_json), \
                 semantic_summary = COALESCE(?2, semantic_summary), \
                 updated_at = ?3 WHERE id = ?4",
                params![keywords_json, update.semantic_summary, now_millis(), id],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Ok(false);
        }
        tx.execute(
            "INSERT OR REPLACE INTO entity_embeddings \
             (entity_id, embedding, embedding_text, source, generated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                encode_f32(&update.embedding),
                update.embedding_text,
                update.source.to_string(),
                update.generated_at.timestamp_millis(),
            ],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        drop(conn);

        self.index.lock().dirty = true;
        Ok(true)
    }

    fn list_entity_ids(&self, kind: Option<EntityKind>) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id FROM entities WHERE (?1 IS NULL OR kind = ?1) ORDER BY created_at, id",
            )
            .map_err(db_err)?;
        let ids = stmt
            .query_map(params![kind.map(|k| k.as_str())], |row| row.get(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(db_err)?;
        Ok(ids)
    }

    fn known_external_ids(&self, kind: EntityKind) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT DISTINCT external_id FROM entities \
                 WHERE kind = ?1 AND external_id IS NOT NULL ORDER BY external_id",
            )
            .map_err(db_err)?;
        let ids = stmt
            .query_map(params![kind.as_str()], |row| row.get(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(db_err)?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prospect_core::EmbeddingSource;
    use tempfile::TempDir;

    const DIM: usize = 4;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path(), DIM).unwrap();
        (store, dir)
    }

    fn update(vector: [f32; DIM], source: EmbeddingSource) -> EmbeddingUpdate {
        EmbeddingUpdate {
            embedding: Array1::from_vec(vector.to_vec()),
            embedding_text: "acme logistics".into(),
            generated_at: Utc::now() - Duration::days(3),
            source,
            search_keywords: Some(vec!["acme".into(), "logistics".into()]),
            semantic_summary: Some("Acme | Logistics".into()),
        }
    }

    #[test]
    fn test_put_and_get_entity() {
        let (store, _dir) = test_store();
        let mut entity = EntityRecord::new("c1", EntityKind::Company).with_field("name", "Acme");
        entity.external_id = Some("ext-1".into());
        store.put_entity(&entity).unwrap();

        let loaded = store.get_entity("c1").unwrap().unwrap();
        assert_eq!(loaded.kind, EntityKind::Company);
        assert_eq!(loaded.field_text("name"), "Acme");
        assert_eq!(loaded.external_id.as_deref(), Some("ext-1"));
        assert!(loaded.embedding.is_none());
        assert!(loaded.embedding_generated_at.is_none());
        assert!(store.get_entity("missing").unwrap().is_none());
    }

    #[test]
    fn test_write_embedding_contract() {
        let (store, _dir) = test_store();
        store
            .put_entity(&EntityRecord::new("c1", EntityKind::Company))
            .unwrap();

        let upd = update([1.0, 0.0, 0.0, 0.0], EmbeddingSource::Primary);
        assert!(store.write_embedding("c1", &upd).unwrap());

        let loaded = store.get_entity("c1").unwrap().unwrap();
        assert_eq!(loaded.embedding.unwrap(), upd.embedding);
        assert_eq!(loaded.embedding_text.as_deref(), Some("acme logistics"));
        assert_eq!(
            loaded.embedding_generated_at.unwrap().timestamp_millis(),
            upd.generated_at.timestamp_millis()
        );
        assert_eq!(loaded.search_keywords, vec!["acme", "logistics"]);
        assert_eq!(loaded.semantic_summary.as_deref(), Some("Acme | Logistics"));
    }

    #[test]
    fn test_write_embedding_unknown_entity() {
        let (store, _dir) = test_store();
        let upd = update([1.0, 0.0, 0.0, 0.0], EmbeddingSource::Primary);
        assert!(!store.write_embedding("ghost", &upd).unwrap());
        assert_eq!(store.get_stats().unwrap().embeddings_stored, 0);
    }

    #[test]
    fn test_put_entity_keeps_embedding() {
        let (store, _dir) = test_store();
        let entity = EntityRecord::new("c1", EntityKind::Company).with_field("name", "Acme");
        store.put_entity(&entity).unwrap();
        store
            .write_embedding("c1", &update([0.0, 1.0, 0.0, 0.0], EmbeddingSource::Fallback))
            .unwrap();

        store
            .put_entity(&entity.with_field("industry", "Robotics"))
            .unwrap();
        let loaded = store.get_entity("c1").unwrap().unwrap();
        assert_eq!(loaded.field_text("industry"), "Robotics");
        assert!(loaded.embedding.is_some());
    }

    #[test]
    fn test_find_similar() {
        let (store, _dir) = test_store();
        for (id, kind, v) in [
            ("c1", EntityKind::Company, [1.0, 0.0, 0.0, 0.0]),
            ("c2", EntityKind::Company, [0.7, 0.7, 0.0, 0.0]),
            ("p1", EntityKind::Employee, [0.9, 0.1, 0.0, 0.0]),
        ] {
            store.put_entity(&EntityRecord::new(id, kind)).unwrap();
            store
                .write_embedding(id, &update(v, EmbeddingSource::Primary))
                .unwrap();
        }

        let query = Array1::from_vec(vec![1.0, 0.0, 0.0, 0.0]);
        let hits = store.find_similar(&query, None, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity_id, "c1");
        assert_eq!(hits[1].entity_id, "p1");

        let companies = store
            .find_similar(&query, Some(EntityKind::Company), 5)
            .unwrap();
        assert_eq!(companies.len(), 2);
        assert!(companies.iter().all(|h| h.kind == EntityKind::Company));

        assert!(store.find_similar(&Array1::zeros(DIM), None, 5).unwrap().is_empty());
        assert!(store.find_similar(&Array1::zeros(3), None, 5).is_err());
    }

    #[test]
    fn test_keyword_search_and_ids() {
        let (store, _dir) = test_store();
        let mut a = EntityRecord::new("c1", EntityKind::Company);
        a.external_id = Some("ext-a".into());
        store.put_entity(&a).unwrap();
        store.put_entity(&EntityRecord::new("p1", EntityKind::Employee)).unwrap();
        store
            .write_embedding("c1", &update([1.0, 0.0, 0.0, 0.0], EmbeddingSource::Primary))
            .unwrap();

        let hits = store
            .search_by_keywords(&["logistics".into()], Some(EntityKind::Company), 10)
            .unwrap();
        assert_eq!(hits, vec![("c1".to_string(), 1)]);

        assert_eq!(store.list_entity_ids(None).unwrap().len(), 2);
        assert_eq!(
            store.list_entity_ids(Some(EntityKind::Employee)).unwrap(),
            vec!["p1"]
        );
        assert_eq!(
            store.known_external_ids(EntityKind::Company).unwrap(),
            vec!["ext-a"]
        );
    }

    #[test]
    fn test_delete_and_stats() {
        let (store, _dir) = test_store();
        store.put_entity(&EntityRecord::new("c1", EntityKind::Company)).unwrap();
        store
            .write_embedding("c1", &update([1.0, 0.0, 0.0, 0.0], EmbeddingSource::Fallback))
            .unwrap();
        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_entities, 1);
        assert_eq!(stats.fallback_embeddings, 1);

        assert!(store.delete_entity("c1").unwrap());
        assert_eq!(store.get_stats().unwrap().embeddings_stored, 0);
        assert!(!store.delete_entity("c1").unwrap());
    }
}
