//! Business Services
//!
//! - `TaxonomyNodeService` - read, write, delete and count taxonomy concept nodes
//!
//! Services coordinate between the graph store layer and callers, applying
//! the mapping between entities and labeled nodes.

pub mod error;
pub mod taxonomy_node_service;

pub use error::TaxonomyServiceError;
pub use taxonomy_node_service::TaxonomyNodeService;
