//! Series Taxonomy Read/Write Core
//!
//! This crate persists `Series` and `AlphavilleSeries` taxonomy concepts as
//! labeled nodes in a property graph.
//!
//! # Architecture
//!
//! - **Upsert by uuid**: every concept node is merged under `Thing` and
//!   carries `Concept`, `Classification` and its taxonomy label
//! - **Full property replace**: each write stores exactly the entity's
//!   non-empty fields
//! - **Pluggable store**: Neo4j in production, an in-process graph in tests
//!
//! # Modules
//!
//! - [`models`] - `Series`, `TaxonomyKind` and stored property values
//! - [`services`] - `TaxonomyNodeService`
//! - [`db`] - `GraphStore` trait, statement templates and backends
//! - [`config`] - Graph store connection settings

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::StoreConfig;
pub use models::*;
pub use services::*;
