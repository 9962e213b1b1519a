//! Entity resolution
//!
//! Turns a free-text mention into the identifier each requested database
//! expects. Resolution never fails: the paths below are tried in order and
//! the first one that succeeds wins.
//!
//! 1. Resolution cache
//! 2. Exact canonical-name match in the identifier table (confidence 0.9)
//! 3. Synonym match in the identifier table (confidence 0.9)
//! 4. External lookup for the entity type, retried with backoff
//!    (confidence 0.8 for drugs and targets, 0.6 for diseases)
//! 5. Pass-through of the mention to every database (confidence 0.5)
//!
//! Paths 2-4 are memoized. Path 5 is not, so a later call can still succeed
//! once the external service recovers.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::cache::ResolutionCache;
use super::table::IdentifierTable;
use super::types::{CanonicalEntity, EntityType, ResolutionRecord};
use super::TARGET_ENTITY;
use crate::databases::database_key;
use crate::error::LookupError;
use crate::lookup::{LookupResult, LookupSet, RetryPolicy};

pub const TABLE_CONFIDENCE: f64 = 0.9;
pub const EXTERNAL_CONFIDENCE: f64 = 0.8;
pub const EXTERNAL_DISEASE_CONFIDENCE: f64 = 0.6;
pub const FALLBACK_CONFIDENCE: f64 = 0.5;
pub const MAX_EXTERNAL_SYNONYMS: usize = 5;

pub struct EntityResolver {
    table: Arc<IdentifierTable>,
    cache: Arc<ResolutionCache>,
    lookups: LookupSet,
    retry: RetryPolicy,
}

impl EntityResolver {
    pub fn new(
        table: Arc<IdentifierTable>,
        cache: Arc<ResolutionCache>,
        lookups: LookupSet,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            table,
            cache,
            lookups,
            retry,
        }
    }

    /// Resolver over a table alone, with a private cache and no external lookups.
    pub fn offline(table: Arc<IdentifierTable>) -> Self {
        Self::new(
            table,
            Arc::new(ResolutionCache::new()),
            LookupSet::none(),
            RetryPolicy::default(),
        )
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn table(&self) -> &IdentifierTable {
        &self.table
    }

    /// Resolve `mention` to an identifier for each of `databases`.
    ///
    /// A cached resolution is returned as stored, even when it was made for a
    /// different set of databases; identifiers for databases it never covered
    /// are then missing from `resolved_identifiers`.
    #[instrument(level = "debug", skip(self, databases))]
    pub async fn resolve(
        &self,
        mention: &str,
        entity_type: EntityType,
        databases: &[String],
    ) -> ResolutionRecord {
        let normalized = normalize_mention(mention);
        let databases = dedup_databases(databases);

        if let Some(cached) = self.cache.get(&normalized, entity_type) {
            debug!(
                target: TARGET_ENTITY,
                "Cache hit for '{}' ({})", normalized, entity_type
            );
            return cached;
        }

        if let Some(entity) = self.table.find(&normalized) {
            debug!(
                target: TARGET_ENTITY,
                "Resolved '{}' to canonical entity '{}'", mention, entity.name
            );
            let record = from_canonical(mention, entity, &databases);
            return self.cache.insert(&normalized, entity_type, record);
        }

        if let Some(record) = self.resolve_external(mention, entity_type, &databases).await {
            return self.cache.insert(&normalized, entity_type, record);
        }

        info!(
            target: TARGET_ENTITY,
            "No resolution for '{}' ({}), passing it through", mention, entity_type
        );
        ResolutionRecord::passthrough(mention, &databases, FALLBACK_CONFIDENCE)
    }

    async fn resolve_external(
        &self,
        mention: &str,
        entity_type: EntityType,
        databases: &[String],
    ) -> Option<ResolutionRecord> {
        let lookup = self.lookups.for_type(entity_type)?;
        let label = format!("{} lookup for '{}'", lookup.name(), mention);

        match self
            .retry
            .run_if(&label, LookupError::is_transient, || {
                lookup.lookup(mention, entity_type)
            })
            .await
        {
            Ok(Some(found)) => {
                info!(
                    target: TARGET_ENTITY,
                    "Resolved '{}' ({}) via {}", mention, entity_type, lookup.name()
                );
                Some(from_lookup(mention, entity_type, found, databases))
            }
            Ok(None) => {
                debug!(
                    target: TARGET_ENTITY,
                    "{} has no entry for '{}'", lookup.name(), mention
                );
                None
            }
            Err(err) => {
                warn!(
                    target: TARGET_ENTITY,
                    "External resolution failed for '{}': {}", mention, err
                );
                None
            }
        }
    }
}

/// Cache and table key for a mention.
pub fn normalize_mention(mention: &str) -> String {
    mention.trim().to_lowercase()
}

/// Requested databases without repeats, in first-seen order.
pub fn dedup_databases(databases: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(databases.len());
    for db in databases {
        if !unique.contains(db) {
            unique.push(db.clone());
        }
    }
    unique
}

fn from_canonical(mention: &str, entity: &CanonicalEntity, databases: &[String]) -> ResolutionRecord {
    let resolved_identifiers = databases
        .iter()
        .map(|db| {
            let id = entity
                .identifiers
                .get(database_key(db))
                .cloned()
                .unwrap_or_else(|| mention.to_string());
            (db.clone(), id)
        })
        .collect();

    ResolutionRecord {
        original: mention.to_string(),
        resolved_identifiers,
        synonyms: entity.synonyms.clone(),
        confidence: TABLE_CONFIDENCE,
    }
}

fn from_lookup(
    mention: &str,
    entity_type: EntityType,
    found: LookupResult,
    databases: &[String],
) -> ResolutionRecord {
    let resolved_identifiers = databases
        .iter()
        .map(|db| {
            let id = found
                .per_database_ids
                .get(db.as_str())
                .or_else(|| found.per_database_ids.get(database_key(db)))
                .cloned()
                .unwrap_or_else(|| mention.to_string());
            (db.clone(), id)
        })
        .collect();

    let confidence = match entity_type {
        EntityType::Disease => EXTERNAL_DISEASE_CONFIDENCE,
        _ => EXTERNAL_CONFIDENCE,
    };

    ResolutionRecord {
        original: mention.to_string(),
        resolved_identifiers,
        synonyms: found
            .synonyms
            .into_iter()
            .take(MAX_EXTERNAL_SYNONYMS)
            .collect(),
        confidence,
    }
}
