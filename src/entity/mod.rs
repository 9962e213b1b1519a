pub mod cache;
pub mod resolver;
pub mod table;
pub mod types;

pub use cache::ResolutionCache;
pub use resolver::EntityResolver;
pub use table::IdentifierTable;
pub use types::*;

// Module-level constants
pub const TARGET_ENTITY: &str = "entity";
