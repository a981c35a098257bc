//! Graph Query Templates
//!
//! The closed set of statements the taxonomy service issues. Each variant is
//! interpreted directly by `InMemoryGraphStore` and rendered to parameterised
//! Cypher by `Neo4jStore`.
//!
//! Values always travel as parameters. Labels and property names cannot be
//! parameterised in Cypher, so they are checked against a plain identifier
//! pattern and back-quoted before they reach the statement text.

use crate::db::graph_store::{
    LABELS_ADDED, LABELS_REMOVED, NODES_CREATED, NODES_DELETED, PROPERTIES_SET,
};
use crate::db::StoreError;
use crate::models::{PropertyKind, PropertyMap, PropertySpec, UUID_PROPERTY};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Column holding a fetched node's labels
pub const LABELS_COLUMN: &str = "labels";

/// Column holding a node count
pub const COUNT_COLUMN: &str = "count";

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// A statement against the concept graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQuery {
    /// Find-or-create the node with `uuid` under `merge_label`, replace its
    /// whole property set with `properties`, then apply `labels`
    MergeNode {
        merge_label: String,
        uuid: String,
        properties: PropertyMap,
        labels: Vec<String>,
    },

    /// Remove `labels` from the node with `uuid` under `match_label` and
    /// replace its property set with `properties`
    StripNode {
        match_label: String,
        uuid: String,
        labels: Vec<String>,
        properties: PropertyMap,
    },

    /// Delete the node with `uuid` under `match_label` if it has no relationships
    DeleteIfOrphaned { match_label: String, uuid: String },

    /// Project `properties` and the label set of the node with `uuid` under `label`
    FetchNode {
        label: String,
        uuid: String,
        properties: Vec<PropertySpec>,
    },

    /// Count nodes carrying `label`
    CountNodes { label: String },
}

/// A parameter value bound into a Cypher statement
#[derive(Debug, Clone, PartialEq)]
pub enum CypherParam {
    Text(String),
    List(Vec<String>),
    Map(PropertyMap),
}

/// Decoded shape of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    TextList,
    Integer,
}

/// A result column the statement returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A rendered Cypher statement
#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    pub text: String,
    pub params: BTreeMap<String, CypherParam>,
    pub columns: Vec<Column>,
    /// Whether the returned row carries mutation counters rather than data
    pub yields_stats: bool,
}

/// Validate a label or property name and back-quote it for statement text
pub fn quote_identifier(name: &str) -> Result<String, StoreError> {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IDENTIFIER_REGEX.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).unwrap());

    if regex.is_match(name) {
        Ok(format!("`{}`", name))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

fn label_chain(labels: &[String]) -> Result<String, StoreError> {
    labels
        .iter()
        .map(|label| quote_identifier(label).map(|quoted| format!(":{}", quoted)))
        .collect()
}

fn stats_columns(names: &[&str]) -> Vec<Column> {
    names
        .iter()
        .map(|name| Column::new(*name, ColumnKind::Integer))
        .collect()
}

impl GraphQuery {
    /// Whether the statement mutates the graph and reports counters
    pub fn yields_stats(&self) -> bool {
        matches!(
            self,
            GraphQuery::MergeNode { .. }
                | GraphQuery::StripNode { .. }
                | GraphQuery::DeleteIfOrphaned { .. }
        )
    }

    /// Check every label and projected property name is a plain identifier
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            GraphQuery::MergeNode {
                merge_label: anchor,
                labels,
                ..
            }
            | GraphQuery::StripNode {
                match_label: anchor,
                labels,
                ..
            } => {
                quote_identifier(anchor)?;
                label_chain(labels)?;
            }
            GraphQuery::DeleteIfOrphaned { match_label, .. } => {
                quote_identifier(match_label)?;
            }
            GraphQuery::FetchNode {
                label, properties, ..
            } => {
                quote_identifier(label)?;
                for spec in properties {
                    quote_identifier(spec.name)?;
                }
            }
            GraphQuery::CountNodes { label } => {
                quote_identifier(label)?;
            }
        }
        Ok(())
    }

    /// Render the statement as parameterised Cypher
    pub fn to_cypher(&self) -> Result<CypherStatement, StoreError> {
        let uuid_key = quote_identifier(UUID_PROPERTY)?;
        let mut params = BTreeMap::new();

        let (text, columns) = match self {
            GraphQuery::MergeNode {
                merge_label,
                uuid,
                properties,
                labels,
            } => {
                let anchor = quote_identifier(merge_label)?;
                params.insert("uuid".to_string(), CypherParam::Text(uuid.clone()));
                params.insert("props".to_string(), CypherParam::Map(properties.clone()));
                params.insert("labels".to_string(), CypherParam::List(labels.clone()));

                let set_labels = if labels.is_empty() {
                    String::new()
                } else {
                    format!("SET n{}\n", label_chain(labels)?)
                };
                let text = format!(
                    "OPTIONAL MATCH (existing:{anchor} {{{uuid_key}: $uuid}})\n\
                     WITH count(existing) AS existingCount\n\
                     MERGE (n:{anchor} {{{uuid_key}: $uuid}})\n\
                     WITH n, existingCount, size([l IN $labels WHERE NOT l IN labels(n)]) AS labelsAdded\n\
                     SET n = $props\n\
                     {set_labels}\
                     RETURN CASE WHEN existingCount = 0 THEN 1 ELSE 0 END AS {NODES_CREATED}, \
                     labelsAdded AS {LABELS_ADDED}, size(keys($props)) AS {PROPERTIES_SET}"
                );
                (
                    text,
                    stats_columns(&[NODES_CREATED, LABELS_ADDED, PROPERTIES_SET]),
                )
            }
            GraphQuery::StripNode {
                match_label,
                uuid,
                labels,
                properties,
            } => {
                let anchor = quote_identifier(match_label)?;
                params.insert("uuid".to_string(), CypherParam::Text(uuid.clone()));
                params.insert("props".to_string(), CypherParam::Map(properties.clone()));
                params.insert("labels".to_string(), CypherParam::List(labels.clone()));

                let remove_labels = if labels.is_empty() {
                    String::new()
                } else {
                    format!("REMOVE n{}\n", label_chain(labels)?)
                };
                let text = format!(
                    "MATCH (n:{anchor} {{{uuid_key}: $uuid}})\n\
                     WITH n, size([l IN $labels WHERE l IN labels(n)]) AS labelsRemoved\n\
                     {remove_labels}\
                     SET n = $props\n\
                     RETURN labelsRemoved AS {LABELS_REMOVED}, size(keys($props)) AS {PROPERTIES_SET}"
                );
                (text, stats_columns(&[LABELS_REMOVED, PROPERTIES_SET]))
            }
            GraphQuery::DeleteIfOrphaned { match_label, uuid } => {
                let anchor = quote_identifier(match_label)?;
                params.insert("uuid".to_string(), CypherParam::Text(uuid.clone()));

                let text = format!(
                    "MATCH (n:{anchor} {{{uuid_key}: $uuid}})\n\
                     OPTIONAL MATCH (n)-[r]-()\n\
                     WITH n, count(r) AS relCount\n\
                     WHERE relCount = 0\n\
                     DELETE n\n\
                     RETURN count(*) AS {NODES_DELETED}"
                );
                (text, stats_columns(&[NODES_DELETED]))
            }
            GraphQuery::FetchNode {
                label,
                uuid,
                properties,
            } => {
                let label = quote_identifier(label)?;
                params.insert("uuid".to_string(), CypherParam::Text(uuid.clone()));

                let mut projections = Vec::with_capacity(properties.len() + 1);
                let mut columns = Vec::with_capacity(properties.len() + 1);
                for spec in properties {
                    let name = quote_identifier(spec.name)?;
                    projections.push(format!("n.{name} AS {name}"));
                    let kind = match spec.kind {
                        PropertyKind::Text => ColumnKind::Text,
                        PropertyKind::List => ColumnKind::TextList,
                    };
                    columns.push(Column::new(spec.name, kind));
                }
                projections.push(format!("labels(n) AS {LABELS_COLUMN}"));
                columns.push(Column::new(LABELS_COLUMN, ColumnKind::TextList));

                let text = format!(
                    "MATCH (n:{label} {{{uuid_key}: $uuid}})\nRETURN {}",
                    projections.join(", ")
                );
                (text, columns)
            }
            GraphQuery::CountNodes { label } => {
                let label = quote_identifier(label)?;
                let text = format!("MATCH (n:{label}) RETURN count(n) AS {COUNT_COLUMN}");
                (text, vec![Column::new(COUNT_COLUMN, ColumnKind::Integer)])
            }
        };

        Ok(CypherStatement {
            text,
            params,
            columns,
            yields_stats: self.yields_stats(),
        })
    }
}
