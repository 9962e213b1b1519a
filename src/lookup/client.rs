//! HTTP client creation and request handling for lookup services.

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tokio::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::LookupError;
use crate::TARGET_WEB_REQUEST;

const USER_AGENT: &str = concat!("drugquery/", env!("CARGO_PKG_VERSION"));

/// Create the client shared by all lookup services
pub fn create_http_client(timeout: Duration) -> Result<reqwest::Client> {
    debug!(target: TARGET_WEB_REQUEST, "Creating lookup HTTP client with {:?} timeout", timeout);

    reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

/// GET a JSON document. A 404 is reported as `Ok(None)`, any other non-success
/// status as an error.
pub async fn get_json(
    client: &reqwest::Client,
    service: &'static str,
    url: Url,
) -> Result<Option<Value>, LookupError> {
    debug!(target: TARGET_WEB_REQUEST, "Requesting {} from {}", service, url);

    let response = client
        .get(url)
        .header(header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|source| LookupError::Request { service, source })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        debug!(target: TARGET_WEB_REQUEST, "{} has no entry (404)", service);
        return Ok(None);
    }
    if !status.is_success() {
        return Err(LookupError::Status {
            service,
            status: status.as_u16(),
        });
    }

    let body = response
        .json::<Value>()
        .await
        .map_err(|source| LookupError::Request { service, source })?;
    Ok(Some(body))
}

/// Parse a configured base URL, tolerating a trailing slash.
pub fn base_url(raw: &str) -> Result<Url, LookupError> {
    Ok(Url::parse(raw.trim_end_matches('/'))?)
}

/// Append percent-encoded path segments to a base URL.
pub fn endpoint(base: &Url, service: &'static str, segments: &[&str]) -> Result<Url, LookupError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| LookupError::Malformed {
            service,
            reason: format!("{} cannot be a base URL", base),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let url = base_url("https://rest.uniprot.org/").unwrap();
        assert_eq!(url.as_str(), "https://rest.uniprot.org/");

        assert!(base_url("not a url").is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = base_url("https://pubchem.ncbi.nlm.nih.gov/rest/pug").unwrap();
        let url = endpoint(
            &base,
            "PubChem",
            &["compound", "name", "imatinib mesylate", "synonyms", "JSON"],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/imatinib%20mesylate/synonyms/JSON"
        );
    }

    #[test]
    fn test_create_http_client() {
        assert!(create_http_client(Duration::from_secs(5)).is_ok());
    }
}
