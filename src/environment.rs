use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

use crate::entity::{EntityResolver, IdentifierTable, ResolutionCache};
use crate::lookup::{
    base_url, create_http_client, BioPortalLookup, LookupSet, PubChemLookup, RetryPolicy,
    UniProtLookup, DEFAULT_BIOPORTAL_URL, DEFAULT_PUBCHEM_URL, DEFAULT_UNIPROT_URL,
};
use crate::query::DEFAULT_QUERY_TIMEOUT;
use crate::TARGET_QUERY;

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
/// Empty entries are dropped.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>`
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    split_list(&env::var(var).unwrap_or_default(), delimiter)
}

fn split_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn get_env_var_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn get_env_flag(var: &str) -> bool {
    parse_flag(&env::var(var).unwrap_or_default())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupSettings {
    pub timeout: Duration,
    pub pubchem_url: String,
    pub uniprot_url: String,
    pub bioportal_url: String,
    pub bioportal_api_key: Option<String>,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            pubchem_url: DEFAULT_PUBCHEM_URL.to_string(),
            uniprot_url: DEFAULT_UNIPROT_URL.to_string(),
            bioportal_url: DEFAULT_BIOPORTAL_URL.to_string(),
            bioportal_api_key: None,
        }
    }
}

/// Runtime configuration, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub databases: Vec<String>,
    pub identifier_table_path: Option<String>,
    pub retry: RetryPolicy,
    pub lookup: LookupSettings,
    pub query_timeout: Duration,
    pub offline: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            databases: vec!["OpenTargets".to_string()],
            identifier_table_path: None,
            retry: RetryPolicy::default(),
            lookup: LookupSettings::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            offline: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();

        let mut databases = get_env_var_as_vec("DATABASES", ';');
        if databases.is_empty() {
            databases = defaults.databases;
        }

        let retry = RetryPolicy {
            max_attempts: get_env_var_or("LOOKUP_MAX_ATTEMPTS", defaults.retry.max_attempts),
            base_delay: Duration::from_millis(get_env_var_or(
                "LOOKUP_BASE_DELAY_MS",
                defaults.retry.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(get_env_var_or(
                "LOOKUP_MAX_DELAY_MS",
                defaults.retry.max_delay.as_millis() as u64,
            )),
        };

        let lookup = LookupSettings {
            timeout: Duration::from_secs(get_env_var_or(
                "LOOKUP_TIMEOUT_SECS",
                defaults.lookup.timeout.as_secs(),
            )),
            pubchem_url: env::var("PUBCHEM_URL").unwrap_or(defaults.lookup.pubchem_url),
            uniprot_url: env::var("UNIPROT_URL").unwrap_or(defaults.lookup.uniprot_url),
            bioportal_url: env::var("BIOPORTAL_URL").unwrap_or(defaults.lookup.bioportal_url),
            bioportal_api_key: env::var("BIOPORTAL_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        };

        Settings {
            databases,
            identifier_table_path: env::var("IDENTIFIER_TABLE_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty()),
            retry,
            lookup,
            query_timeout: Duration::from_secs(get_env_var_or(
                "QUERY_TIMEOUT_SECS",
                defaults.query_timeout.as_secs(),
            )),
            offline: get_env_flag("OFFLINE"),
        }
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = self.offline || offline;
        self
    }

    pub fn load_identifier_table(&self) -> Result<IdentifierTable> {
        match &self.identifier_table_path {
            Some(path) => IdentifierTable::from_json_file(path),
            None => Ok(IdentifierTable::builtin()),
        }
    }

    /// The external lookups for drugs, targets and diseases, or none when
    /// running offline.
    pub fn build_lookups(&self) -> Result<LookupSet> {
        if self.offline {
            info!(target: TARGET_QUERY, "Offline mode, external lookups disabled");
            return Ok(LookupSet::none());
        }

        let client = create_http_client(self.lookup.timeout)?;
        let pubchem = base_url(&self.lookup.pubchem_url).context("Invalid PUBCHEM_URL")?;
        let uniprot = base_url(&self.lookup.uniprot_url).context("Invalid UNIPROT_URL")?;
        let bioportal = base_url(&self.lookup.bioportal_url).context("Invalid BIOPORTAL_URL")?;

        Ok(LookupSet::none()
            .with_drug(Arc::new(PubChemLookup::new(client.clone(), pubchem)))
            .with_target(Arc::new(UniProtLookup::new(client.clone(), uniprot)))
            .with_disease(Arc::new(BioPortalLookup::new(
                client,
                bioportal,
                self.lookup.bioportal_api_key.clone(),
            ))))
    }

    pub fn build_resolver(&self) -> Result<EntityResolver> {
        let table = self.load_identifier_table()?;
        let lookups = self.build_lookups()?;
        Ok(EntityResolver::new(
            Arc::new(table),
            Arc::new(ResolutionCache::new()),
            lookups,
            self.retry,
        ))
    }
}
