use dashmap::DashMap;
use tracing::debug;

use super::types::{EntityType, ResolutionRecord};
use super::TARGET_ENTITY;

/// Process-wide memo of resolved entities, keyed by normalized mention and
/// entity type. Entries never expire; `clear` exists for tests.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<(String, EntityType), ResolutionRecord>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, normalized: &str, entity_type: EntityType) -> Option<ResolutionRecord> {
        self.entries
            .get(&(normalized.to_string(), entity_type))
            .map(|entry| entry.value().clone())
    }

    /// Memoize a record unless the key is already populated, and return
    /// whichever record the cache holds afterwards.
    pub fn insert(
        &self,
        normalized: &str,
        entity_type: EntityType,
        record: ResolutionRecord,
    ) -> ResolutionRecord {
        let stored = self
            .entries
            .entry((normalized.to_string(), entity_type))
            .or_insert(record)
            .value()
            .clone();

        debug!(
            target: TARGET_ENTITY,
            "Cached resolution for '{}' ({})", normalized, entity_type
        );
        stored
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(original: &str, confidence: f64) -> ResolutionRecord {
        ResolutionRecord::passthrough(original, &["OpenTargets".to_string()], confidence)
    }

    #[test]
    fn test_key_includes_entity_type() {
        let cache = ResolutionCache::new();
        cache.insert("jak2", EntityType::Target, record("JAK2", 0.9));

        assert!(cache.get("jak2", EntityType::Target).is_some());
        assert!(cache.get("jak2", EntityType::Drug).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = ResolutionCache::new();
        let first = cache.insert("x", EntityType::Drug, record("X", 0.8));
        let second = cache.insert("x", EntityType::Drug, record("x", 0.5));

        assert_eq!(first, second);
        assert_eq!(cache.get("x", EntityType::Drug).unwrap().confidence, 0.8);
    }

    #[test]
    fn test_clear() {
        let cache = ResolutionCache::new();
        cache.insert("x", EntityType::Drug, record("X", 0.8));
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("x", EntityType::Drug).is_none());
    }

    #[test]
    fn test_concurrent_inserts_converge() {
        let cache = Arc::new(ResolutionCache::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.insert("shared", EntityType::Drug, record("Shared", i as f64 / 10.0))
                })
            })
            .collect();

        let results: Vec<ResolutionRecord> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every writer observes the same stored record
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.len(), 1);
    }
}
