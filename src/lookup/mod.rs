//! External identifier lookups used when a mention is not in the identifier
//! table. Each entity type has its own service; all of them are reached over
//! HTTP and are safe to retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entity::EntityType;
use crate::error::LookupError;

pub mod bioportal;
pub mod client;
pub mod pubchem;
pub mod retry;
pub mod uniprot;

pub use bioportal::{BioPortalLookup, DEFAULT_BIOPORTAL_URL};
pub use client::{base_url, create_http_client};
pub use pubchem::{PubChemLookup, DEFAULT_PUBCHEM_URL};
pub use retry::RetryPolicy;
pub use uniprot::{UniProtLookup, DEFAULT_UNIPROT_URL};

/// Answer from an external lookup service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub synonyms: Vec<String>,

    // Database (display name or internal key) -> identifier
    #[serde(default)]
    pub per_database_ids: BTreeMap<String, String>,
}

/// An identifier lookup service.
///
/// `Ok(None)` means the service answered and knows nothing about the mention;
/// errors are transient and may be retried.
#[async_trait]
pub trait IdentifierLookup: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(
        &self,
        mention: &str,
        entity_type: EntityType,
    ) -> Result<Option<LookupResult>, LookupError>;
}

/// The lookup service to use for each entity type.
#[derive(Clone, Default)]
pub struct LookupSet {
    drug: Option<Arc<dyn IdentifierLookup>>,
    target: Option<Arc<dyn IdentifierLookup>>,
    disease: Option<Arc<dyn IdentifierLookup>>,
}

impl LookupSet {
    /// No external lookups at all; unknown mentions pass through.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_drug(mut self, lookup: Arc<dyn IdentifierLookup>) -> Self {
        self.drug = Some(lookup);
        self
    }

    pub fn with_target(mut self, lookup: Arc<dyn IdentifierLookup>) -> Self {
        self.target = Some(lookup);
        self
    }

    pub fn with_disease(mut self, lookup: Arc<dyn IdentifierLookup>) -> Self {
        self.disease = Some(lookup);
        self
    }

    /// Phases and unrecognized entity types have no lookup service.
    pub fn for_type(&self, entity_type: EntityType) -> Option<&Arc<dyn IdentifierLookup>> {
        match entity_type {
            EntityType::Drug => self.drug.as_ref(),
            EntityType::Target => self.target.as_ref(),
            EntityType::Disease => self.disease.as_ref(),
            EntityType::Phase | EntityType::Other => None,
        }
    }
}

impl std::fmt::Debug for LookupSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupSet")
            .field("drug", &self.drug.as_ref().map(|l| l.name()))
            .field("target", &self.target.as_ref().map(|l| l.name()))
            .field("disease", &self.disease.as_ref().map(|l| l.name()))
            .finish()
    }
}
