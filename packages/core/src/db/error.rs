//! Graph Store Error Types
//!
//! This module defines error types for graph store operations, covering
//! connectivity, query execution, constraint and result decoding failures.

use thiserror::Error;

/// Graph store operation errors
///
/// These are surfaced unchanged by the service layer; callers see exactly
/// what the store reported.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or reported itself unhealthy
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    /// A statement was rejected or failed during execution
    #[error("Query failed: {context}")]
    QueryFailed { context: String },

    /// A uniqueness constraint would be violated
    #[error("Uniqueness constraint on :{label}({property}) violated by value '{value}'")]
    ConstraintViolation {
        label: String,
        property: String,
        value: String,
    },

    /// A label or property name is not a plain identifier
    #[error("Invalid identifier for label or property: '{0}'")]
    InvalidIdentifier(String),

    /// Mutation statistics were requested but not reported
    #[error("No statistics reported for statement {index} of the batch")]
    MissingStats { index: usize },

    /// A result column could not be decoded
    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    /// Neo4j driver error
    #[cfg(feature = "neo4j")]
    #[error("Neo4j operation failed: {0}")]
    Neo4j(#[from] neo4rs::Error),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a query failed error with context
    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::QueryFailed {
            context: context.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(
        label: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::ConstraintViolation {
            label: label.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// Create a column decode error
    pub fn decode(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
