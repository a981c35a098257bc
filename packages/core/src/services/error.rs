//! Service Layer Error Types
//!
//! This module defines error types for taxonomy service operations. Store
//! errors pass through unchanged so callers see exactly what the graph store
//! reported.

use crate::db::StoreError;
use crate::models::ValidationError;
use thiserror::Error;

/// Taxonomy service operation errors
#[derive(Error, Debug)]
pub enum TaxonomyServiceError {
    /// Graph store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Entity failed validation before a write, or a stored node could not
    /// be mapped back onto an entity
    #[error("Invalid entity: {0}")]
    InvalidEntity(#[from] ValidationError),

    /// Request body was not a valid entity document
    #[error("Failed to decode entity JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request body could not be read
    #[error("Failed to read entity body: {0}")]
    Io(#[from] std::io::Error),

    /// The body's uuid differs from the identity it was submitted under
    #[error("Uuid '{actual}' in body does not match '{expected}'")]
    UuidMismatch { expected: String, actual: String },
}

impl TaxonomyServiceError {
    /// Create a uuid mismatch error
    pub fn uuid_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::UuidMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
