//! GraphStore Trait - Graph Database Abstraction Layer
//!
//! This module defines the `GraphStore` trait that abstracts the labeled
//! property graph the taxonomy service persists into. The trait lets the
//! service run against Neo4j in production and an in-process graph in tests
//! without changing any business logic.
//!
//! # Architecture
//!
//! - **Abstraction Point**: Between `TaxonomyNodeService` and the database
//! - **Batch Execution**: Statements are sent as an ordered batch that the
//!   store applies atomically (all statements or none)
//! - **Mutation Statistics**: Each statement may request the counters the
//!   store applied (labels added/removed, properties set, nodes created/deleted)
//!
//! # Examples
//!
//! ```rust
//! use series_rw_core::db::{GraphQuery, GraphStore, InMemoryGraphStore, Statement};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), series_rw_core::db::StoreError> {
//! let store: Arc<dyn GraphStore> = Arc::new(InMemoryGraphStore::new());
//!
//! let results = store
//!     .execute_batch(vec![Statement::new(GraphQuery::CountNodes {
//!         label: "Series".to_string(),
//!     })])
//!     .await?;
//! assert_eq!(results[0].rows[0]["count"], 0);
//! # Ok(())
//! # }
//! ```

use crate::db::{GraphQuery, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row, keyed by column name
pub type Row = Map<String, Value>;

/// Column names mutating statements report their counters under
pub const NODES_CREATED: &str = "nodesCreated";
pub const NODES_DELETED: &str = "nodesDeleted";
pub const LABELS_ADDED: &str = "labelsAdded";
pub const LABELS_REMOVED: &str = "labelsRemoved";
pub const PROPERTIES_SET: &str = "propertiesSet";

/// A query plus whether its mutation statistics should be reported
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query: GraphQuery,
    pub include_stats: bool,
}

impl Statement {
    pub fn new(query: GraphQuery) -> Self {
        Self {
            query,
            include_stats: false,
        }
    }

    pub fn with_stats(query: GraphQuery) -> Self {
        Self {
            query,
            include_stats: true,
        }
    }
}

/// Mutation counters applied by one statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub contains_updates: bool,
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub properties_set: i64,
}

impl QueryStats {
    /// Build counters from a row of counter columns; absent columns count as zero
    pub fn from_row(row: Option<&Row>) -> Self {
        let counter = |name: &str| {
            row.and_then(|r| r.get(name))
                .and_then(Value::as_i64)
                .unwrap_or(0)
        };
        Self {
            contains_updates: false,
            nodes_created: counter(NODES_CREATED),
            nodes_deleted: counter(NODES_DELETED),
            labels_added: counter(LABELS_ADDED),
            labels_removed: counter(LABELS_REMOVED),
            properties_set: counter(PROPERTIES_SET),
        }
        .with_update_flag()
    }

    /// Recompute `contains_updates` from the counters
    pub fn with_update_flag(mut self) -> Self {
        self.contains_updates = self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.labels_added > 0
            || self.labels_removed > 0
            || self.properties_set > 0;
        self
    }
}

/// Outcome of one statement in a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    /// Projected rows (empty for mutating statements)
    pub rows: Vec<Row>,

    /// Present only when the statement asked for statistics
    pub stats: Option<QueryStats>,
}

/// Abstraction layer for graph persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the service is shared behind `Arc`
/// across request handlers.
///
/// # Atomicity
///
/// `execute_batch` applies its statements in order inside one transaction.
/// If any statement fails, none of the batch's effects are visible and the
/// error is returned.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute an ordered batch of statements atomically
    ///
    /// # Returns
    ///
    /// One `StatementResult` per statement, in the same order.
    ///
    /// # Errors
    ///
    /// Returns the store's error verbatim: connectivity failures, rejected
    /// statements, constraint violations or undecodable results.
    async fn execute_batch(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<StatementResult>, StoreError>;

    /// Ensure a uniqueness constraint exists on `property` for nodes labeled `label`
    ///
    /// Idempotent: an existing constraint is left in place.
    async fn ensure_unique_constraint(&self, label: &str, property: &str)
        -> Result<(), StoreError>;

    /// Liveness probe
    async fn ping(&self) -> Result<(), StoreError>;
}
