//! Embedding regeneration policy.

use chrono::{DateTime, Duration, Utc};
use prospect_core::EntityRecord;

/// Embeddings older than this are regenerated.
pub const STALENESS_WINDOW_DAYS: i64 = 30;

/// Whether `entity` needs a fresh embedding.
///
/// Regenerate when the entity is new, has no vector or timestamp, or the
/// vector is older than the staleness window. The rule is the same for every
/// entity kind.
pub fn needs_regeneration(entity: &EntityRecord, is_new: bool, now: DateTime<Utc>) -> bool {
    if is_new || entity.embedding.is_none() {
        return true;
    }
    match entity.embedding_generated_at {
        Some(generated_at) => now - generated_at > Duration::days(STALENESS_WINDOW_DAYS),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use prospect_core::EntityKind;

    fn embedded(days_ago: i64, now: DateTime<Utc>) -> EntityRecord {
        let mut entity = EntityRecord::new("c1", EntityKind::Company);
        entity.embedding = Some(Array1::zeros(4));
        entity.embedding_generated_at = Some(now - Duration::days(days_ago));
        entity
    }

    #[test]
    fn test_stale_regenerates() {
        let now = Utc::now();
        assert!(needs_regeneration(&embedded(31, now), false, now));
    }

    #[test]
    fn test_fresh_skips() {
        let now = Utc::now();
        assert!(!needs_regeneration(&embedded(10, now), false, now));
        assert!(!needs_regeneration(&embedded(30, now), false, now));
    }

    #[test]
    fn test_new_entity_always_regenerates() {
        let now = Utc::now();
        assert!(needs_regeneration(&embedded(1, now), true, now));
    }

    #[test]
    fn test_missing_vector_regenerates() {
        let now = Utc::now();
        let mut entity = embedded(1, now);
        entity.embedding = None;
        assert!(needs_regeneration(&entity, false, now));

        let mut entity = embedded(1, now);
        entity.embedding_generated_at = None;
        assert!(needs_regeneration(&entity, false, now));
    }
}
