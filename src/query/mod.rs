//! Request orchestration: resolve entities, fan out to database clients and
//! harmonize what comes back.

pub mod sample;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

use crate::databases::database_key;
use crate::entity::resolver::dedup_databases;
use crate::entity::{EntityResolver, EntityType, ResolutionRecord};
use crate::harmonize::{HarmonizedResults, Harmonizer, Intent, RawRecord};
use crate::TARGET_QUERY;

pub use sample::SampleOpenTargetsClient;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// A source of raw records for one database.
///
/// "No results" is an empty vector, not an error. Errors are reported to the
/// pipeline, which logs them and carries on with the other databases.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    async fn query(&self, context: &QueryContext) -> Result<Vec<RawRecord>>;
}

/// What a database client gets to work with.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub database: String,
    pub intent: Intent,
    pub entities: BTreeMap<EntityType, ResolutionRecord>,
}

impl QueryContext {
    pub fn entity(&self, entity_type: EntityType) -> Option<&ResolutionRecord> {
        self.entities.get(&entity_type)
    }

    /// Identifier resolved for this context's database.
    pub fn identifier(&self, entity_type: EntityType) -> Option<&str> {
        self.entity(entity_type)
            .and_then(|record| record.identifier_for(&self.database))
    }

    /// The mention as the user wrote it.
    pub fn mention(&self, entity_type: EntityType) -> Option<&str> {
        self.entity(entity_type).map(|record| record.original.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub entities: BTreeMap<EntityType, String>,
    pub intent: Intent,
    pub databases: Vec<String>,
}

impl QueryRequest {
    pub fn new(intent: Intent, databases: Vec<String>) -> Self {
        Self {
            entities: BTreeMap::new(),
            intent,
            databases,
        }
    }

    pub fn with_entity(mut self, entity_type: EntityType, mention: &str) -> Self {
        self.entities.insert(entity_type, mention.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryInfo {
    pub intent: Intent,
    pub resolved_entities: BTreeMap<EntityType, ResolutionRecord>,
    pub databases_queried: Vec<String>,
    pub failed_databases: Vec<String>,
    pub unsupported_databases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub data: HarmonizedResults,
    pub message: String,
    pub total_records: usize,
    pub query_info: QueryInfo,
}

enum Outcome {
    Records(Vec<RawRecord>),
    Failed,
    Unsupported,
}

pub struct QueryPipeline {
    resolver: Arc<EntityResolver>,
    clients: HashMap<String, Arc<dyn DatabaseClient>>,
    harmonizer: Harmonizer,
    query_timeout: Duration,
}

impl QueryPipeline {
    pub fn new(resolver: Arc<EntityResolver>) -> Self {
        Self {
            resolver,
            clients: HashMap::new(),
            harmonizer: Harmonizer::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Register the client for a database, by display name or key.
    pub fn with_client(mut self, database: &str, client: Arc<dyn DatabaseClient>) -> Self {
        self.clients
            .insert(database_key(database).to_string(), client);
        self
    }

    pub fn with_harmonizer(mut self, harmonizer: Harmonizer) -> Self {
        self.harmonizer = harmonizer;
        self
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    pub fn supports(&self, database: &str) -> bool {
        self.clients.contains_key(database_key(database))
    }

    pub async fn run(&self, request: QueryRequest) -> QueryResponse {
        let databases = dedup_databases(&request.databases);
        info!(
            target: TARGET_QUERY,
            "Processing {} query against {:?}", request.intent, databases
        );

        let entities = self.resolve_entities(&request.entities, &databases).await;

        let outcomes = join_all(
            databases
                .iter()
                .map(|database| self.query_database(database, &request.intent, &entities)),
        )
        .await;

        let mut records = Vec::new();
        let mut failed_databases = Vec::new();
        let mut unsupported_databases = Vec::new();
        for (database, outcome) in databases.iter().zip(outcomes) {
            match outcome {
                Outcome::Records(mut found) => records.append(&mut found),
                Outcome::Failed => failed_databases.push(database.clone()),
                Outcome::Unsupported => unsupported_databases.push(database.clone()),
            }
        }

        let data = self.harmonizer.harmonize(records, &request.intent);
        let total_records = data.len();
        let message = if failed_databases.is_empty() {
            "Query processed successfully".to_string()
        } else {
            format!(
                "Query processed with errors from {}",
                failed_databases.join(", ")
            )
        };

        info!(
            target: TARGET_QUERY,
            "Returning {} records ({} failed, {} unsupported databases)",
            total_records,
            failed_databases.len(),
            unsupported_databases.len()
        );

        QueryResponse {
            data,
            message,
            total_records,
            query_info: QueryInfo {
                intent: request.intent,
                resolved_entities: entities,
                databases_queried: databases,
                failed_databases,
                unsupported_databases,
            },
        }
    }

    async fn resolve_entities(
        &self,
        mentions: &BTreeMap<EntityType, String>,
        databases: &[String],
    ) -> BTreeMap<EntityType, ResolutionRecord> {
        let pending = mentions
            .iter()
            .filter(|(_, mention)| !mention.trim().is_empty())
            .map(|(entity_type, mention)| async move {
                let record = self
                    .resolver
                    .resolve(mention, *entity_type, databases)
                    .await;
                (*entity_type, record)
            });

        join_all(pending).await.into_iter().collect()
    }

    async fn query_database(
        &self,
        database: &str,
        intent: &Intent,
        entities: &BTreeMap<EntityType, ResolutionRecord>,
    ) -> Outcome {
        let client = match self.clients.get(database_key(database)) {
            Some(client) => client,
            None => {
                warn!(target: TARGET_QUERY, "Database {} not implemented yet", database);
                return Outcome::Unsupported;
            }
        };

        let context = QueryContext {
            database: database.to_string(),
            intent: intent.clone(),
            entities: entities.clone(),
        };

        match timeout(self.query_timeout, client.query(&context)).await {
            Ok(Ok(records)) => {
                info!(
                    target: TARGET_QUERY,
                    "{} returned {} records", database, records.len()
                );
                Outcome::Records(records)
            }
            Ok(Err(e)) => {
                error!(target: TARGET_QUERY, "Error querying {}: {:#}", database, e);
                Outcome::Failed
            }
            Err(_) => {
                error!(
                    target: TARGET_QUERY,
                    "Query to {} timed out after {:?}", database, self.query_timeout
                );
                Outcome::Failed
            }
        }
    }
}
