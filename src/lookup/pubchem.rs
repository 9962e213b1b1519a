use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::client::{endpoint, get_json};
use super::{IdentifierLookup, LookupResult};
use crate::entity::EntityType;
use crate::error::LookupError;
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_PUBCHEM_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
const SERVICE: &str = "PubChem";

/// Drug synonyms from the PubChem PUG REST API.
pub struct PubChemLookup {
    client: reqwest::Client,
    base: Url,
}

impl PubChemLookup {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }
}

#[async_trait]
impl IdentifierLookup for PubChemLookup {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn lookup(
        &self,
        mention: &str,
        _entity_type: EntityType,
    ) -> Result<Option<LookupResult>, LookupError> {
        let url = endpoint(
            &self.base,
            SERVICE,
            &["compound", "name", mention, "synonyms", "JSON"],
        )?;

        let result = get_json(&self.client, SERVICE, url)
            .await?
            .and_then(|body| parse_synonyms(&body));

        debug!(
            target: TARGET_WEB_REQUEST,
            "PubChem lookup for '{}' found {} synonyms",
            mention,
            result.as_ref().map_or(0, |r| r.synonyms.len())
        );
        Ok(result)
    }
}

/// Synonyms of the first compound in a `synonyms/JSON` response. A response
/// without any compound means the name is unknown.
pub fn parse_synonyms(body: &Value) -> Option<LookupResult> {
    let information = body
        .get("InformationList")
        .and_then(|v| v.get("Information"))
        .and_then(|v| v.as_array())?;
    let first = information.first()?;

    let synonyms = first
        .get("Synonym")
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|s| s.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut result = LookupResult {
        synonyms,
        ..Default::default()
    };
    if let Some(cid) = first.get("CID").and_then(|v| v.as_u64()) {
        result
            .per_database_ids
            .insert("PubChem".to_string(), format!("CID{}", cid));
    }
    Some(result)
}
