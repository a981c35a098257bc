//! Series concept entity
//!
//! `Series` is the in-memory shape of a series taxonomy concept, shared by the
//! `Series` and `AlphavilleSeries` taxonomies. It maps onto a node whose
//! properties are exactly the non-empty stored fields below; `type` and
//! `types` are derived from the node's labels on read and never stored.
//!
//! | field                     | stored as                      |
//! |---------------------------|--------------------------------|
//! | `uuid`                    | `uuid`                         |
//! | `pref_label`              | `prefLabel`                    |
//! | `description`             | `description`                  |
//! | `tme_identifier`          | `tmeIdentifier`                |
//! | `alternative_identifiers` | `tmeIdentifiers`, `aliasIds`   |

use crate::models::{PropertyMap, PropertySpec, TaxonomyKind, ValidationError, UUID_PROPERTY};
use serde::{Deserialize, Serialize};

const PREF_LABEL_PROPERTY: &str = "prefLabel";
const DESCRIPTION_PROPERTY: &str = "description";
const TME_IDENTIFIER_PROPERTY: &str = "tmeIdentifier";
const TME_IDENTIFIERS_PROPERTY: &str = "tmeIdentifiers";
const ALIAS_IDS_PROPERTY: &str = "aliasIds";

/// Every property a series node may carry, in projection order
pub const SERIES_PROPERTIES: [PropertySpec; 6] = [
    PropertySpec::text(UUID_PROPERTY),
    PropertySpec::text(PREF_LABEL_PROPERTY),
    PropertySpec::text(DESCRIPTION_PROPERTY),
    PropertySpec::text(TME_IDENTIFIER_PROPERTY),
    PropertySpec::list(TME_IDENTIFIERS_PROPERTY),
    PropertySpec::list(ALIAS_IDS_PROPERTY),
];

/// External-system identifiers grouped by source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeIdentifiers {
    /// Legacy TME taxonomy identifiers
    #[serde(rename = "TME", default)]
    pub tme: Vec<String>,

    /// UUID aliases the concept is also known by
    #[serde(default)]
    pub uuids: Vec<String>,
}

impl AlternativeIdentifiers {
    pub fn is_empty(&self) -> bool {
        self.tme.is_empty() && self.uuids.is_empty()
    }
}

/// A series taxonomy concept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pref_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Single TME identifier carried by older payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tme_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_identifiers: Option<AlternativeIdentifiers>,

    /// Most specific taxonomy label (derived)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,

    /// Taxonomy labels in canonical order (derived)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl Series {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Default::default()
        }
    }

    pub fn with_pref_label(mut self, pref_label: impl Into<String>) -> Self {
        self.pref_label = Some(pref_label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tme_identifier(mut self, tme_identifier: impl Into<String>) -> Self {
        self.tme_identifier = Some(tme_identifier.into());
        self
    }

    pub fn with_alternative_identifiers(mut self, identifiers: AlternativeIdentifiers) -> Self {
        self.alternative_identifiers = Some(identifiers);
        self
    }

    /// Fill in the derived `type` and `types` a stored node of `kind` reports
    pub fn classified(mut self, kind: TaxonomyKind) -> Self {
        self.kind_label = Some(kind.label().to_string());
        self.types = kind.labels().iter().map(|l| l.to_string()).collect();
        self
    }

    /// Validate the entity before it is written
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` when `uuid` is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uuid.trim().is_empty() {
            return Err(ValidationError::MissingField(UUID_PROPERTY.to_string()));
        }
        Ok(())
    }

    /// Build the complete property set to store for this entity
    ///
    /// The map is always built from scratch: empty strings and empty lists
    /// are left out so that writing them clears any previously stored value.
    pub fn to_properties(&self) -> PropertyMap {
        let mut properties = PropertyMap::new();
        properties.insert(UUID_PROPERTY.to_string(), self.uuid.clone().into());

        let scalars = [
            (PREF_LABEL_PROPERTY, &self.pref_label),
            (DESCRIPTION_PROPERTY, &self.description),
            (TME_IDENTIFIER_PROPERTY, &self.tme_identifier),
        ];
        for (name, value) in scalars {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                properties.insert(name.to_string(), value.into());
            }
        }

        if let Some(identifiers) = &self.alternative_identifiers {
            let lists = [
                (TME_IDENTIFIERS_PROPERTY, &identifiers.tme),
                (ALIAS_IDS_PROPERTY, &identifiers.uuids),
            ];
            for (name, values) in lists {
                if !values.is_empty() {
                    properties.insert(name.to_string(), values.clone().into());
                }
            }
        }

        properties
    }

    /// Rebuild an entity from a stored node's properties and labels
    ///
    /// `types` keeps the canonical order of `kind`, restricted to the labels
    /// the node actually carries.
    pub fn from_properties(
        properties: &PropertyMap,
        labels: &[String],
        kind: TaxonomyKind,
    ) -> Result<Self, ValidationError> {
        let uuid = text_property(properties, UUID_PROPERTY)?
            .ok_or_else(|| ValidationError::MissingField(UUID_PROPERTY.to_string()))?;

        let tme = list_property(properties, TME_IDENTIFIERS_PROPERTY)?;
        let uuids = list_property(properties, ALIAS_IDS_PROPERTY)?;
        let alternative_identifiers = AlternativeIdentifiers { tme, uuids };

        Ok(Series {
            uuid,
            pref_label: text_property(properties, PREF_LABEL_PROPERTY)?,
            description: text_property(properties, DESCRIPTION_PROPERTY)?,
            tme_identifier: text_property(properties, TME_IDENTIFIER_PROPERTY)?,
            alternative_identifiers: (!alternative_identifiers.is_empty())
                .then_some(alternative_identifiers),
            kind_label: Some(kind.label().to_string()),
            types: kind
                .labels()
                .iter()
                .filter(|label| labels.iter().any(|l| l == *label))
                .map(|label| label.to_string())
                .collect(),
        })
    }
}

fn text_property(properties: &PropertyMap, name: &str) -> Result<Option<String>, ValidationError> {
    match properties.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_text()
            .map(|s| (!s.is_empty()).then(|| s.to_string()))
            .ok_or_else(|| {
                ValidationError::InvalidProperties(format!("'{}' should be a string", name))
            }),
    }
}

fn list_property(properties: &PropertyMap, name: &str) -> Result<Vec<String>, ValidationError> {
    match properties.get(name) {
        None => Ok(Vec::new()),
        Some(value) => value.as_list().map(<[String]>::to_vec).ok_or_else(|| {
            ValidationError::InvalidProperties(format!("'{}' should be a list of strings", name))
        }),
    }
}
