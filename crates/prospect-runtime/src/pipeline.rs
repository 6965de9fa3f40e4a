//! Entity embedding pipeline: staleness check, canonical text, embedding and
//! write-back of the embedding field contract.

use std::sync::Arc;

use chrono::Utc;
use prospect_core::{BatchSettings, EntityKind, EntityRecord, Error, Result};
use prospect_infer::{needs_regeneration, EmbeddingGenerator};
use prospect_ingest::{canonicalize, extract_keywords, semantic_summary, DEFAULT_KEYWORD_LIMIT};
use prospect_store::{EmbeddingUpdate, EntityStore};
use tracing::{debug, info, warn};

use crate::batch::run_batched;
use crate::types::{RefreshOutcome, RefreshReport, ResultSet};

pub struct EmbeddingPipeline {
    store: Arc<dyn EntityStore>,
    generator: Arc<EmbeddingGenerator>,
    batch: BatchSettings,
}

impl EmbeddingPipeline {
    pub fn new(
        store: Arc<dyn EntityStore>,
        generator: Arc<EmbeddingGenerator>,
        batch: BatchSettings,
    ) -> Self {
        Self {
            store,
            generator,
            batch,
        }
    }

    /// Regenerate the embedding of one entity if it is new or stale.
    pub async fn refresh(&self, entity_id: &str, is_new: bool) -> Result<RefreshOutcome> {
        let entity = self
            .store
            .get_entity(entity_id)?
            .ok_or_else(|| Error::NotFound(format!("entity {}", entity_id)))?;

        if !needs_regeneration(&entity, is_new, Utc::now()) {
            debug!("Embedding for {} is fresh, skipping", entity_id);
            return Ok(RefreshOutcome::Skipped);
        }

        let text = canonicalize(&entity);
        let embedding = self.generator.embed(&text).await;
        let source = embedding.source;

        let mut update = EmbeddingUpdate::from_embedding(embedding);
        update.search_keywords = Some(extract_keywords(&text, DEFAULT_KEYWORD_LIMIT));
        update.semantic_summary = semantic_summary(&entity);

        if !self.store.write_embedding(entity_id, &update)? {
            return Err(Error::NotFound(format!("entity {}", entity_id)));
        }
        debug!("Embedded {} ({})", entity_id, source);
        Ok(RefreshOutcome::Regenerated { source })
    }

    /// Refresh many entities in fixed-size concurrent batches.
    pub async fn refresh_many(&self, ids: Vec<(String, bool)>) -> RefreshReport {
        let outcomes = run_batched(ids, &self.batch, move |(id, is_new)| async move {
            let outcome = self.refresh(&id, is_new).await;
            if let Err(e) = &outcome {
                warn!("Embedding refresh failed for {}: {}", id, e);
            }
            (id, outcome)
        })
        .await;

        let mut report = RefreshReport::default();
        for (id, outcome) in outcomes {
            report.record(id, &outcome);
        }
        report
    }

    /// Refresh every stored entity, optionally of one kind. With `force`,
    /// every entity is treated as new.
    pub async fn refresh_all(&self, kind: Option<EntityKind>, force: bool) -> Result<RefreshReport> {
        let ids = self.store.list_entity_ids(kind)?;
        info!("Refreshing embeddings for {} entities (force={})", ids.len(), force);
        let report = self
            .refresh_many(ids.into_iter().map(|id| (id, force)).collect())
            .await;
        info!(
            "Refresh done: {} regenerated ({} fallback), {} skipped, {} failed",
            report.regenerated, report.fallback, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Persist every item of a result set as an entity of `kind` and embed it.
    ///
    /// Items keep their provider id as entity id; items without one get a
    /// fresh UUID. Re-materializing a known item updates it in place.
    pub async fn materialize(&self, results: &ResultSet, kind: EntityKind) -> Result<RefreshReport> {
        let mut ids = Vec::with_capacity(results.items.len());
        for item in &results.items {
            let entity = entity_from_item(item, kind);
            let is_new = self.store.get_entity(&entity.id)?.is_none();
            self.store.put_entity(&entity)?;
            ids.push((entity.id, is_new));
        }
        info!(
            "Materialized {} {} entities from job {}",
            ids.len(),
            kind,
            results.job_id
        );
        Ok(self.refresh_many(ids).await)
    }
}

/// Build an entity from a provider item.
///
/// Top-level fields are kept as they are; fields nested under `properties`
/// are lifted one level when they do not clash with a top-level key.
pub fn entity_from_item(item: &serde_json::Value, kind: EntityKind) -> EntityRecord {
    let external_id = item
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let id = external_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut entity = EntityRecord::new(id, kind);
    entity.external_id = external_id;

    if let Some(map) = item.as_object() {
        entity.fields = map.clone();
        if let Some(props) = map.get("properties").and_then(|p| p.as_object()) {
            for (key, value) in props {
                entity
                    .fields
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prospect_connectors::JobKind;
    use prospect_core::EmbeddingSource;
    use prospect_store::SqliteStore;
    use serde_json::json;
    use tempfile::TempDir;

    const DIM: usize = 32;

    fn pipeline() -> (EmbeddingPipeline, Arc<SqliteStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path(), DIM).unwrap());
        let generator = Arc::new(EmbeddingGenerator::fallback_only(DIM));
        let batch = BatchSettings {
            batch_size: 2,
            delay_ms: 0,
        };
        let pipeline = EmbeddingPipeline::new(store.clone(), generator, batch);
        (pipeline, store, dir)
    }

    fn company(id: &str) -> EntityRecord {
        EntityRecord::new(id, EntityKind::Company)
            .with_field("name", "Acme Robotics")
            .with_field("industry", "Warehouse automation")
    }

    #[tokio::test]
    async fn test_new_entity_gets_full_field_contract() {
        let (pipeline, store, _dir) = pipeline();
        store.put_entity(&company("c1")).unwrap();

        let outcome = pipeline.refresh("c1", true).await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Regenerated {
                source: EmbeddingSource::Fallback
            }
        );

        let stored = store.get_entity("c1").unwrap().unwrap();
        assert_eq!(stored.embedding.unwrap().len(), DIM);
        assert!(stored.embedding_text.unwrap().contains("Acme Robotics"));
        assert!(stored.embedding_generated_at.is_some());
        assert!(stored.search_keywords.contains(&"warehouse".to_string()));
        assert!(stored.semantic_summary.is_some());
    }

    #[tokio::test]
    async fn test_fresh_embedding_is_left_alone() {
        let (pipeline, store, _dir) = pipeline();
        store.put_entity(&company("c1")).unwrap();
        let mut update = EmbeddingUpdate::from_embedding(
            EmbeddingGenerator::fallback_only(DIM).embed_fallback("older text"),
        );
        update.generated_at = Utc::now() - Duration::days(10);
        store.write_embedding("c1", &update).unwrap();

        assert_eq!(
            pipeline.refresh("c1", false).await.unwrap(),
            RefreshOutcome::Skipped
        );
        let stored = store.get_entity("c1").unwrap().unwrap();
        assert_eq!(stored.embedding_text.as_deref(), Some("older text"));
        assert_eq!(stored.embedding.unwrap(), update.embedding);
    }

    #[tokio::test]
    async fn test_stale_embedding_is_regenerated() {
        let (pipeline, store, _dir) = pipeline();
        store.put_entity(&company("c1")).unwrap();
        let mut update = EmbeddingUpdate::from_embedding(
            EmbeddingGenerator::fallback_only(DIM).embed_fallback("older text"),
        );
        update.generated_at = Utc::now() - Duration::days(31);
        store.write_embedding("c1", &update).unwrap();

        assert!(matches!(
            pipeline.refresh("c1", false).await.unwrap(),
            RefreshOutcome::Regenerated { .. }
        ));
        let stored = store.get_entity("c1").unwrap().unwrap();
        assert_ne!(stored.embedding_text.as_deref(), Some("older text"));
    }

    #[tokio::test]
    async fn test_missing_entity_is_not_found() {
        let (pipeline, _store, _dir) = pipeline();
        assert!(matches!(
            pipeline.refresh("ghost", true).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_materialize_and_refresh_all() {
        let (pipeline, store, _dir) = pipeline();
        let results = ResultSet {
            job_id: "ws_1".into(),
            kind: JobKind::Search,
            items: vec![
                json!({"id": "item_a", "properties": {"name": "Acme", "description": "Robots"}}),
                json!({"id": "item_b", "name": "Globex"}),
                json!({"name": "No Id Corp"}),
            ],
            warning: None,
        };

        let report = pipeline
            .materialize(&results, EntityKind::Company)
            .await
            .unwrap();
        assert_eq!(report.entity_ids.len(), 3);
        assert_eq!(report.regenerated, 3);
        assert_eq!(report.fallback, 3);
        assert_eq!(
            store.known_external_ids(EntityKind::Company).unwrap(),
            vec!["item_a", "item_b"]
        );
        assert_eq!(
            store.get_entity("item_a").unwrap().unwrap().field_text("name"),
            "Acme"
        );

        let report = pipeline.refresh_all(None, false).await.unwrap();
        assert_eq!(report.skipped, 3);
        let report = pipeline
            .refresh_all(Some(EntityKind::Company), true)
            .await
            .unwrap();
        assert_eq!(report.regenerated, 3);
    }

    #[test]
    fn test_entity_from_item_keeps_top_level_fields() {
        let item = json!({"id": "x", "name": "Top", "properties": {"name": "Nested", "city": "Austin"}});
        let entity = entity_from_item(&item, EntityKind::Company);
        assert_eq!(entity.id, "x");
        assert_eq!(entity.field_text("name"), "Top");
        assert_eq!(entity.field_text("city"), "Austin");

        let anon = entity_from_item(&json!({"name": "Anon"}), EntityKind::Employee);
        assert!(anon.external_id.is_none());
        assert_eq!(anon.id.len(), 36);
    }
}
