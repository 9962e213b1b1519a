use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::client::{endpoint, get_json};
use super::{IdentifierLookup, LookupResult};
use crate::entity::EntityType;
use crate::error::LookupError;
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_UNIPROT_URL: &str = "https://rest.uniprot.org";
const SERVICE: &str = "UniProt";

/// Target (gene/protein) synonyms from the UniProtKB search API.
pub struct UniProtLookup {
    client: reqwest::Client,
    base: Url,
}

impl UniProtLookup {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }
}

#[async_trait]
impl IdentifierLookup for UniProtLookup {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn lookup(
        &self,
        mention: &str,
        _entity_type: EntityType,
    ) -> Result<Option<LookupResult>, LookupError> {
        let mut url = endpoint(&self.base, SERVICE, &["uniprotkb", "search"])?;
        url.query_pairs_mut()
            .append_pair("query", mention)
            .append_pair("format", "json")
            .append_pair("size", "1");

        let result = get_json(&self.client, SERVICE, url)
            .await?
            .and_then(|body| parse_search(&body));

        debug!(
            target: TARGET_WEB_REQUEST,
            "UniProt lookup for '{}' matched: {}", mention, result.is_some()
        );
        Ok(result)
    }
}

/// Gene synonyms and accession of the top search hit.
pub fn parse_search(body: &Value) -> Option<LookupResult> {
    let entry = body
        .get("results")
        .and_then(|v| v.as_array())
        .and_then(|results| results.first())?;

    let synonyms = entry
        .get("genes")
        .and_then(|v| v.as_array())
        .and_then(|genes| genes.first())
        .and_then(|gene| gene.get("synonyms"))
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|s| s.get("value").and_then(|v| v.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut result = LookupResult {
        synonyms,
        ..Default::default()
    };
    if let Some(accession) = entry.get("primaryAccession").and_then(|v| v.as_str()) {
        result
            .per_database_ids
            .insert("UniProt".to_string(), accession.to_string());
    }
    Some(result)
}
