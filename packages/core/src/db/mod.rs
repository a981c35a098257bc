//! Graph Store Layer
//!
//! This module handles all interaction with the labeled property graph that
//! holds taxonomy concept nodes:
//!
//! - `GraphStore` trait: atomic statement batches, uniqueness constraints, liveness
//! - `GraphQuery`: the closed set of statements the service issues
//! - `Neo4jStore`: production backend over Bolt (feature `neo4j`)
//! - `InMemoryGraphStore`: in-process backend for tests and local runs

mod error;
pub mod graph_store;
mod memory_store;
#[cfg(feature = "neo4j")]
mod neo4j_store;
pub mod query;

pub use error::StoreError;
pub use graph_store::{GraphStore, QueryStats, Row, Statement, StatementResult};
pub use memory_store::InMemoryGraphStore;
#[cfg(feature = "neo4j")]
pub use neo4j_store::Neo4jStore;
pub use query::{GraphQuery, COUNT_COLUMN, LABELS_COLUMN};
