//! Data Models
//!
//! This module contains the data structures the service moves between callers
//! and the graph store:
//!
//! - `Series` - The series taxonomy concept entity
//! - `TaxonomyKind` - Which taxonomy (and therefore which labels) a node belongs to
//! - `PropertyValue` / `PropertyMap` - Stored node properties

mod property;
mod series;
mod taxonomy;


pub use property::{PropertyKind, PropertyMap, PropertySpec, PropertyValue};
pub use series::{AlternativeIdentifiers, Series, SERIES_PROPERTIES};
pub use taxonomy::{
    TaxonomyKind, CLASSIFICATION_LABEL, CONCEPT_LABEL, THING_LABEL, UUID_PROPERTY,
};

use thiserror::Error;

/// Entity validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Properties validation failed: {0}")]
    InvalidProperties(String),
}
