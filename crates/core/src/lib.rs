//! Indexing and query engine tying Scanner, Store, QueryEngine,
//! DetailExtractor, and ArtifactResolver together into one running process
//! (base spec §2, §5). Adapters (`jarscope-cli`, `jarscope-mcp`) construct a
//! [`JarscopeEngine`](engine::JarscopeEngine) and call through it; nothing in
//! this crate is reachable except through that one wiring point.

pub mod config;
pub mod detail;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod logging;
pub mod query;
pub mod resolver;
pub mod store;

pub use config::Config;
pub use detail::DetailExtractor;
pub use engine::JarscopeEngine;
pub use error::{CoreError, Result};
pub use indexer::{IndexOutcome, Indexer};
pub use query::QueryEngine;
pub use resolver::ArtifactResolver;
pub use store::Store;
