pub mod databases;
pub mod entity;
pub mod environment;
pub mod error;
pub mod harmonize;
pub mod logging;
pub mod lookup;
pub mod query;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_QUERY: &str = "query";

pub use databases::{database_key, AVAILABLE_DATABASES};
pub use entity::{EntityResolver, EntityType, IdentifierTable, ResolutionCache, ResolutionRecord};
pub use environment::Settings;
pub use error::{HarmonizeError, LookupError};
pub use harmonize::{HarmonizedRecord, HarmonizedResults, Harmonizer, Intent, RawRecord};
pub use query::{DatabaseClient, QueryPipeline, QueryRequest, QueryResponse};
