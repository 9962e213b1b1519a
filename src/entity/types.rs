use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Entity type enumeration, as labelled by the upstream extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Drug,
    Target,
    Disease,
    Phase,
    Other,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Drug => write!(f, "drug"),
            EntityType::Target => write!(f, "target"),
            EntityType::Disease => write!(f, "disease"),
            EntityType::Phase => write!(f, "phase"),
            EntityType::Other => write!(f, "other"),
        }
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "drug" => EntityType::Drug,
            "target" => EntityType::Target,
            "disease" => EntityType::Disease,
            "phase" => EntityType::Phase,
            _ => EntityType::Other,
        }
    }
}

/// A row of the identifier table: one canonical entity with its synonyms and
/// the identifier it carries in each database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    // Lowercased canonical name, unique within a table
    pub name: String,

    // Lowercased synonyms, first-seen order
    #[serde(default)]
    pub synonyms: Vec<String>,

    // Internal database key -> identifier
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
}

impl CanonicalEntity {
    pub fn new(name: &str) -> Self {
        CanonicalEntity {
            name: name.trim().to_lowercase(),
            synonyms: Vec::new(),
            identifiers: BTreeMap::new(),
        }
    }

    pub fn with_synonym(mut self, synonym: &str) -> Self {
        let synonym = synonym.trim().to_lowercase();
        if !synonym.is_empty() && !self.synonyms.contains(&synonym) {
            self.synonyms.push(synonym);
        }
        self
    }

    pub fn with_identifier(mut self, database: &str, identifier: &str) -> Self {
        self.identifiers
            .insert(database.to_string(), identifier.to_string());
        self
    }

    pub fn has_synonym(&self, normalized: &str) -> bool {
        self.synonyms.iter().any(|s| s == normalized)
    }
}

/// Outcome of resolving one entity mention against a set of databases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    // Mention exactly as supplied by the caller
    pub original: String,

    // Requested database name -> identifier to query it with
    pub resolved_identifiers: BTreeMap<String, String>,

    pub synonyms: Vec<String>,

    // Heuristic reliability of the resolution path, in [0, 1]
    pub confidence: f64,
}

impl ResolutionRecord {
    /// Pass-through record: every database gets the mention verbatim.
    pub fn passthrough(mention: &str, databases: &[String], confidence: f64) -> Self {
        ResolutionRecord {
            original: mention.to_string(),
            resolved_identifiers: databases
                .iter()
                .map(|db| (db.clone(), mention.to_string()))
                .collect(),
            synonyms: Vec::new(),
            confidence,
        }
    }

    /// Identifier for a database, by requested display name.
    pub fn identifier_for(&self, database: &str) -> Option<&str> {
        self.resolved_identifiers.get(database).map(String::as_str)
    }
}
