use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::debug;

use serde_json::Value;

use super::schema::{RawRecord, SENTINEL};
use super::TARGET_HARMONIZE;
use crate::databases::database_key;

lazy_static! {
    static ref STANDARD_MAPPER: SchemaMapper = SchemaMapper::new()
        .with_source(
            "OpenTargets",
            &[
                ("drug_name", "drug"),
                ("chembl_id", "drug_id"),
                ("disease_id", "efo_id"),
                ("clinical_phase", "phase"),
                ("evidence_score", "score"),
            ],
        )
        .with_source(
            "ClinicalTrials",
            &[
                ("intervention_name", "drug"),
                ("condition", "disease_name"),
                ("study_phase", "phase"),
            ],
        )
        .with_source(
            "ClinVar",
            &[
                ("gene_symbol", "target_symbol"),
                ("variant_id", "snp_id"),
                ("clinical_significance", "evidence"),
            ],
        );
}

/// Per-source field rename tables, keyed by internal database key.
#[derive(Debug, Clone, Default)]
pub struct SchemaMapper {
    sources: HashMap<String, Vec<(String, String)>>,
}

impl SchemaMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mappings for OpenTargets, ClinicalTrials and ClinVar.
    pub fn standard() -> Self {
        STANDARD_MAPPER.clone()
    }

    /// Register (or extend) the rename table for a source. Later renames for
    /// the same source field replace earlier ones.
    pub fn with_source(mut self, source: &str, renames: &[(&str, &str)]) -> Self {
        let table = self
            .sources
            .entry(database_key(source).to_string())
            .or_default();
        for (from, to) in renames {
            table.retain(|(existing, _)| existing != from);
            table.push((from.to_string(), to.to_string()));
        }
        self
    }

    /// Rename table for a source, accepting either its display name or key.
    pub fn renames_for(&self, source: &str) -> Option<&[(String, String)]> {
        self.sources
            .get(database_key(source.trim()))
            .map(Vec::as_slice)
    }

    /// Copy source-specific fields onto their canonical names. The original
    /// fields are kept. A missing source value never replaces a canonical
    /// value the record already has. Records whose `source` is missing or
    /// unknown are left untouched.
    pub fn apply(&self, record: &mut RawRecord) {
        let renames = match record
            .get("source")
            .and_then(|v| v.as_str())
            .and_then(|source| self.renames_for(source))
        {
            Some(renames) => renames,
            None => return,
        };

        for (from, to) in renames {
            if let Some(value) = record.get(from).cloned() {
                if is_missing(&value) && record.get(to).is_some_and(|v| !is_missing(v)) {
                    continue;
                }
                debug!(target: TARGET_HARMONIZE, "Mapping {} -> {}", from, to);
                record.insert(to.clone(), value);
            }
        }
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s == SENTINEL,
        _ => false,
    }
}
