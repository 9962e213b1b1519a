//! Identifier table
//!
//! Static mapping of canonical entity names to their synonyms and
//! database-specific identifiers. A table is built once at startup, either
//! from the built-in rows or from a JSON file, and then shared read-only with
//! the resolver. Nothing mutates it afterwards.
//!
//! ## JSON format
//! ```json
//! {
//!   "imatinib": {
//!     "synonyms": ["gleevec", "sti571"],
//!     "identifiers": { "OpenTargets": "CHEMBL941", "PubChem": "CID5291" }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

use super::types::CanonicalEntity;
use super::TARGET_ENTITY;

type BuiltinRow = (&'static str, &'static [&'static str], &'static [(&'static str, &'static str)]);

// (name, synonyms, identifiers keyed by internal database key)
const BUILTIN_ENTITIES: &[BuiltinRow] = &[
    // Drugs
    (
        "imatinib",
        &["gleevec", "imatinib mesylate", "sti571"],
        &[
            ("OpenTargets", "CHEMBL941"),
            ("ChEMBL", "CHEMBL941"),
            ("PubChem", "CID5291"),
            ("ClinicalTrials", "Imatinib"),
        ],
    ),
    (
        "rituximab",
        &["rituxan", "mabthera"],
        &[
            ("OpenTargets", "CHEMBL1201576"),
            ("ChEMBL", "CHEMBL1201576"),
            ("PubChem", "CID387447"),
            ("ClinicalTrials", "Rituximab"),
        ],
    ),
    (
        "dasatinib",
        &["sprycel", "bms-354825"],
        &[
            ("OpenTargets", "CHEMBL1421"),
            ("ChEMBL", "CHEMBL1421"),
            ("PubChem", "CID3062316"),
            ("ClinicalTrials", "Dasatinib"),
        ],
    ),
    // Targets
    (
        "jak2",
        &["janus kinase 2", "jak-2"],
        &[
            ("OpenTargets", "ENSG00000096968"),
            ("UniProt", "P52333"),
            ("ClinVar", "JAK2"),
            ("Human Protein Atlas", "JAK2"),
        ],
    ),
    (
        "tp53",
        &["tumor protein p53", "p53"],
        &[
            ("OpenTargets", "ENSG00000141510"),
            ("UniProt", "P04637"),
            ("ClinVar", "TP53"),
            ("Human Protein Atlas", "TP53"),
        ],
    ),
    // Diseases
    (
        "breast cancer",
        &["mammary cancer", "breast carcinoma"],
        &[
            ("OpenTargets", "EFO_0000305"),
            ("MONDO", "MONDO_0007254"),
            ("ClinicalTrials", "Breast Cancer"),
        ],
    ),
    (
        "alopecia",
        &["hair loss", "baldness"],
        &[
            ("OpenTargets", "EFO_0000756"),
            ("MONDO", "MONDO_0000001"),
            ("ClinicalTrials", "Alopecia"),
        ],
    ),
];

#[derive(Debug, Deserialize)]
struct TableEntry {
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    identifiers: BTreeMap<String, String>,
}

/// Immutable lookup table of canonical entities.
#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    entities: Vec<CanonicalEntity>,
    // Canonical name -> position in `entities`
    by_name: HashMap<String, usize>,
}

impl IdentifierTable {
    pub fn new(entities: Vec<CanonicalEntity>) -> Self {
        let mut table = IdentifierTable::default();
        for entity in entities {
            table.push(entity);
        }
        table
    }

    /// The table the service ships with.
    pub fn builtin() -> Self {
        let entities = BUILTIN_ENTITIES
            .iter()
            .map(|(name, synonyms, identifiers)| {
                let entity = synonyms
                    .iter()
                    .fold(CanonicalEntity::new(name), |e, s| e.with_synonym(s));
                identifiers
                    .iter()
                    .fold(entity, |e, (db, id)| e.with_identifier(db, id))
            })
            .collect();
        Self::new(entities)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        // Keep file order so synonym scans are deterministic
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).context("Identifier table is not a JSON object")?;

        let mut entities = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let entry: TableEntry = serde_json::from_value(value)
                .with_context(|| format!("Invalid identifier table entry '{}'", name))?;

            let entity = entry
                .synonyms
                .iter()
                .fold(CanonicalEntity::new(&name), |e, s| e.with_synonym(s));
            let entity = entry
                .identifiers
                .iter()
                .fold(entity, |e, (db, id)| e.with_identifier(db, id));
            entities.push(entity);
        }

        Ok(Self::new(entities))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read identifier table {}", path.display()))?;
        let table = Self::from_json_str(&json)?;

        info!(
            target: TARGET_ENTITY,
            "Loaded {} canonical entities from {}", table.len(), path.display()
        );
        Ok(table)
    }

    fn push(&mut self, entity: CanonicalEntity) {
        if entity.name.is_empty() || self.by_name.contains_key(&entity.name) {
            debug!(
                target: TARGET_ENTITY,
                "Skipping empty or duplicate identifier table entry '{}'", entity.name
            );
            return;
        }
        self.by_name.insert(entity.name.clone(), self.entities.len());
        self.entities.push(entity);
    }

    /// Exact lookup by canonical name. Expects an already normalized name.
    pub fn get(&self, normalized: &str) -> Option<&CanonicalEntity> {
        self.by_name.get(normalized).map(|&idx| &self.entities[idx])
    }

    /// First row, in table order, listing `normalized` among its synonyms.
    pub fn find_by_synonym(&self, normalized: &str) -> Option<&CanonicalEntity> {
        self.entities.iter().find(|e| e.has_synonym(normalized))
    }

    /// Canonical name match first, then synonym scan.
    pub fn find(&self, normalized: &str) -> Option<&CanonicalEntity> {
        self.get(normalized)
            .or_else(|| self.find_by_synonym(normalized))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalEntity> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = IdentifierTable::builtin();
        assert_eq!(table.len(), 7);

        let imatinib = table.get("imatinib").unwrap();
        assert_eq!(imatinib.identifiers.get("OpenTargets").unwrap(), "CHEMBL941");
        assert_eq!(
            imatinib.synonyms,
            vec!["gleevec", "imatinib mesylate", "sti571"]
        );

        assert_eq!(
            table.get("jak2").unwrap().identifiers.get("UniProt").unwrap(),
            "P52333"
        );
        assert!(table.get("Imatinib").is_none());
    }

    #[test]
    fn test_find_by_synonym() {
        let table = IdentifierTable::builtin();

        assert_eq!(table.find("gleevec").unwrap().name, "imatinib");
        assert_eq!(table.find("hair loss").unwrap().name, "alopecia");
        assert_eq!(table.find("tp53").unwrap().name, "tp53");
        assert!(table.find("aspirin").is_none());
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "Aspirin": {
                "synonyms": ["ASA", "acetylsalicylic acid", "asa"],
                "identifiers": { "ChEMBL": "CHEMBL25" }
            },
            "ibuprofen": {}
        }"#;

        let table = IdentifierTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 2);

        let aspirin = table.get("aspirin").unwrap();
        assert_eq!(aspirin.synonyms, vec!["asa", "acetylsalicylic acid"]);
        assert_eq!(aspirin.identifiers.get("ChEMBL").unwrap(), "CHEMBL25");

        let ibuprofen = table.get("ibuprofen").unwrap();
        assert!(ibuprofen.synonyms.is_empty());
        assert!(ibuprofen.identifiers.is_empty());
    }

    #[test]
    fn test_from_json_str_rejects_bad_input() {
        assert!(IdentifierTable::from_json_str("[1, 2, 3]").is_err());
        assert!(IdentifierTable::from_json_str(r#"{"x": {"synonyms": 4}}"#).is_err());
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let table = IdentifierTable::new(vec![
            CanonicalEntity::new("jak2").with_identifier("UniProt", "P52333"),
            CanonicalEntity::new("JAK2").with_identifier("UniProt", "OTHER"),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("jak2").unwrap().identifiers.get("UniProt").unwrap(),
            "P52333"
        );
    }
}
