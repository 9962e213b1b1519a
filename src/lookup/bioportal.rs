use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::client::{endpoint, get_json};
use super::{IdentifierLookup, LookupResult};
use crate::entity::EntityType;
use crate::error::LookupError;
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_BIOPORTAL_URL: &str = "https://data.bioontology.org";
const SERVICE: &str = "BioPortal";

/// Disease synonyms from the BioPortal ontology search.
///
/// BioPortal requires an API key. Without one the lookup still answers, with
/// no synonyms, so that diseases missing from the identifier table resolve
/// through the weaker external path instead of the unknown-entity fallback.
pub struct BioPortalLookup {
    client: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl BioPortalLookup {
    pub fn new(client: reqwest::Client, base: Url, api_key: Option<String>) -> Self {
        Self {
            client,
            base,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl IdentifierLookup for BioPortalLookup {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn lookup(
        &self,
        mention: &str,
        _entity_type: EntityType,
    ) -> Result<Option<LookupResult>, LookupError> {
        let Some(api_key) = &self.api_key else {
            debug!(
                target: TARGET_WEB_REQUEST,
                "No BioPortal API key, passing '{}' through", mention
            );
            return Ok(Some(LookupResult::default()));
        };

        let mut url = endpoint(&self.base, SERVICE, &["search"])?;
        url.query_pairs_mut()
            .append_pair("q", mention)
            .append_pair("require_exact_match", "true")
            .append_pair("apikey", api_key);

        let body = get_json(&self.client, SERVICE, url).await?;
        Ok(body.and_then(|body| parse_search(&body)))
    }
}

/// Synonyms of the first matching ontology class.
pub fn parse_search(body: &Value) -> Option<LookupResult> {
    let class = body
        .get("collection")
        .and_then(|v| v.as_array())
        .and_then(|c| c.first())?;

    let synonyms = class
        .get("synonym")
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|s| s.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(LookupResult {
        synonyms,
        ..Default::default()
    })
}
