//! Taxonomy labels carried by every series concept node.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root label every concept node is merged under
pub const THING_LABEL: &str = "Thing";

/// Label shared by all taxonomy concepts
pub const CONCEPT_LABEL: &str = "Concept";

/// Label shared by all classifications
pub const CLASSIFICATION_LABEL: &str = "Classification";

/// Identity property of every concept node
pub const UUID_PROPERTY: &str = "uuid";

/// The concrete taxonomy a service instance reads and writes.
///
/// Both kinds share one entity shape and differ only in their most specific
/// label, so a kind is a property of the service rather than of the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxonomyKind {
    Series,
    AlphavilleSeries,
}

impl TaxonomyKind {
    /// The most specific label, also reported as the entity `type`
    pub fn label(self) -> &'static str {
        match self {
            TaxonomyKind::Series => "Series",
            TaxonomyKind::AlphavilleSeries => "AlphavilleSeries",
        }
    }

    /// Canonical ordered label set, least to most specific
    pub fn labels(self) -> [&'static str; 4] {
        [
            THING_LABEL,
            CONCEPT_LABEL,
            CLASSIFICATION_LABEL,
            self.label(),
        ]
    }

    /// Labels applied on write and stripped on delete (everything but `Thing`)
    pub fn taxonomy_labels(self) -> [&'static str; 3] {
        [CONCEPT_LABEL, CLASSIFICATION_LABEL, self.label()]
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaxonomyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "series" => Ok(TaxonomyKind::Series),
            "alphaville-series" | "alphaville_series" | "alphavilleseries" => {
                Ok(TaxonomyKind::AlphavilleSeries)
            }
            other => Err(format!(
                "Unknown taxonomy kind '{}': expected 'series' or 'alphaville-series'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_in_canonical_order() {
        assert_eq!(
            TaxonomyKind::Series.labels(),
            ["Thing", "Concept", "Classification", "Series"]
        );
        assert_eq!(
            TaxonomyKind::AlphavilleSeries.labels(),
            ["Thing", "Concept", "Classification", "AlphavilleSeries"]
        );
    }

    #[test]
    fn test_taxonomy_labels_exclude_thing() {
        assert!(!TaxonomyKind::Series
            .taxonomy_labels()
            .contains(&THING_LABEL));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("series".parse(), Ok(TaxonomyKind::Series));
        assert_eq!("Series".parse(), Ok(TaxonomyKind::Series));
        assert_eq!(
            "alphaville-series".parse(),
            Ok(TaxonomyKind::AlphavilleSeries)
        );
        assert_eq!(
            "AlphavilleSeries".parse(),
            Ok(TaxonomyKind::AlphavilleSeries)
        );
        assert!("brand".parse::<TaxonomyKind>().is_err());
    }
}
