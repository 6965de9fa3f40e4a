//! Entity store capability used by the embedding pipeline.

use prospect_core::{EntityKind, EntityRecord, Result};

use crate::types::EmbeddingUpdate;

/// Read/write access to entities and their embedding fields.
pub trait EntityStore: Send + Sync {
    /// Insert or replace an entity's provider fields. Embedding fields are
    /// left untouched.
    fn put_entity(&self, entity: &EntityRecord) -> Result<()>;

    /// Get an entity, including its embedding fields.
    fn get_entity(&self, id: &str) -> Result<Option<EntityRecord>>;

    /// Write the embedding field contract. Returns false if the entity does not exist.
    fn write_embedding(&self, id: &str, update: &EmbeddingUpdate) -> Result<bool>;

    /// Entity ids, optionally restricted to one kind.
    fn list_entity_ids(&self, kind: Option<EntityKind>) -> Result<Vec<String>>;

    /// Provider identifiers already stored for `kind`.
    fn known_external_ids(&self, kind: EntityKind) -> Result<Vec<String>>;
}
