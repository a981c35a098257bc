//! Neo4j implementation of `GraphStore`
//!
//! Renders each `GraphQuery` to parameterised Cypher and runs a batch inside
//! one explicit transaction. Mutation counters come back as ordinary result
//! columns computed by the statement itself, so they do not depend on the
//! driver exposing server-side summary statistics.

use crate::config::StoreConfig;
use crate::db::graph_store::{GraphStore, QueryStats, Row, Statement, StatementResult};
use crate::db::query::{quote_identifier, ColumnKind, CypherParam, CypherStatement};
use crate::db::StoreError;
use crate::models::{PropertyMap, PropertyValue};
use async_trait::async_trait;
use neo4rs::{query, BoltMap, BoltString, BoltType, ConfigBuilder, Graph, Query};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Graph store backed by a Neo4j server over Bolt
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Arc<Graph>,
    uri: String,
}

impl std::fmt::Debug for Neo4jStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jStore").field("uri", &self.uri).finish()
    }
}

impl Neo4jStore {
    /// Connect a pooled client using `config`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the configuration is invalid or
    /// the server cannot be reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate().map_err(StoreError::unavailable)?;

        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }
        let neo4j_config = builder
            .build()
            .map_err(|e| StoreError::unavailable(format!("Invalid Neo4j configuration: {}", e)))?;

        let graph = Graph::connect(neo4j_config).await.map_err(|e| {
            StoreError::unavailable(format!("Failed to connect to {}: {}", config.uri, e))
        })?;

        info!("Connected to Neo4j at {}", config.uri);
        Ok(Self {
            graph: Arc::new(graph),
            uri: config.uri.clone(),
        })
    }

    fn build_query(statement: &CypherStatement) -> Query {
        statement
            .params
            .iter()
            .fold(query(&statement.text), |q, (name, value)| {
                q.param(name, to_bolt(value))
            })
    }

    async fn run_batch(
        &self,
        rendered: &[(CypherStatement, bool)],
    ) -> Result<Vec<StatementResult>, StoreError> {
        let mut txn = self.graph.start_txn().await?;
        let mut results = Vec::with_capacity(rendered.len());

        for (statement, include_stats) in rendered {
            let outcome = async {
                let mut stream = txn.execute(Self::build_query(statement)).await?;
                let mut rows = Vec::new();
                while let Some(row) = stream.next(txn.handle()).await? {
                    rows.push(decode_row(statement, &row)?);
                }
                Ok::<_, StoreError>(rows)
            }
            .await;

            let rows = match outcome {
                Ok(rows) => rows,
                Err(error) => {
                    if let Err(rollback_error) = txn.rollback().await {
                        warn!("Rollback after failed statement also failed: {}", rollback_error);
                    }
                    return Err(error);
                }
            };

            results.push(if statement.yields_stats {
                StatementResult {
                    rows: Vec::new(),
                    stats: include_stats.then(|| QueryStats::from_row(rows.first())),
                }
            } else {
                StatementResult { rows, stats: None }
            });
        }

        txn.commit().await?;
        Ok(results)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    #[instrument(skip(self, statements), fields(count = statements.len()))]
    async fn execute_batch(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<StatementResult>, StoreError> {
        let rendered = statements
            .iter()
            .map(|s| Ok((s.query.to_cypher()?, s.include_stats)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let results = self.run_batch(&rendered).await?;
        debug!("Committed batch of {} statements", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn ensure_unique_constraint(
        &self,
        label: &str,
        property: &str,
    ) -> Result<(), StoreError> {
        let text = format!(
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
            quote_identifier(label)?,
            quote_identifier(property)?
        );
        self.graph.run(query(&text)).await?;
        debug!("Ensured uniqueness of {}.{}", label, property);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| StoreError::unavailable(format!("{} did not answer: {}", self.uri, e)))
    }
}

fn property_to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Text(s) => BoltType::from(s.clone()),
        PropertyValue::List(items) => BoltType::from(items.clone()),
    }
}

fn properties_to_bolt(properties: &PropertyMap) -> BoltType {
    let mut map = BoltMap::new();
    for (name, value) in properties {
        map.put(BoltString::from(name.as_str()), property_to_bolt(value));
    }
    BoltType::Map(map)
}

fn to_bolt(param: &CypherParam) -> BoltType {
    match param {
        CypherParam::Text(s) => BoltType::from(s.clone()),
        CypherParam::List(items) => BoltType::from(items.clone()),
        CypherParam::Map(properties) => properties_to_bolt(properties),
    }
}

fn decode_row(statement: &CypherStatement, row: &neo4rs::Row) -> Result<Row, StoreError> {
    let mut decoded = Row::new();
    for column in &statement.columns {
        let name = column.name.as_str();
        let value = match column.kind {
            ColumnKind::Text => row
                .get::<Option<String>>(name)
                .map_err(|e| StoreError::decode(name, e.to_string()))?
                .map(Value::String)
                .unwrap_or(Value::Null),
            ColumnKind::TextList => row
                .get::<Option<Vec<String>>>(name)
                .map_err(|e| StoreError::decode(name, e.to_string()))?
                .map(|items| Value::Array(items.into_iter().map(Value::String).collect()))
                .unwrap_or(Value::Null),
            ColumnKind::Integer => row
                .get::<i64>(name)
                .map(Value::from)
                .map_err(|e| StoreError::decode(name, e.to_string()))?,
        };
        decoded.insert(column.name.clone(), value);
    }
    Ok(decoded)
}
