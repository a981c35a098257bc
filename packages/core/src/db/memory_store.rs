//! In-process implementation of `GraphStore`
//!
//! Holds a small labeled property graph behind a `tokio::sync::RwLock` and
//! interprets `GraphQuery` variants directly. Batches are applied to a copy
//! of the graph and swapped in only once every statement and uniqueness
//! constraint has passed, so a failing batch leaves no trace.
//!
//! Used by the test suites and as a stand-in store when Neo4j is not wanted.

use crate::db::graph_store::{GraphStore, QueryStats, Row, Statement, StatementResult};
use crate::db::query::{quote_identifier, GraphQuery, COUNT_COLUMN, LABELS_COLUMN};
use crate::db::StoreError;
use crate::models::{PropertyMap, PropertyValue, UUID_PROPERTY};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

type NodeId = u64;

#[derive(Debug, Clone, Default)]
struct StoredNode {
    labels: BTreeSet<String>,
    properties: PropertyMap,
}

impl StoredNode {
    fn has_uuid(&self, uuid: &str) -> bool {
        self.properties
            .get(UUID_PROPERTY)
            .and_then(PropertyValue::as_text)
            == Some(uuid)
    }
}

#[derive(Debug, Clone)]
struct Relationship {
    from: NodeId,
    to: NodeId,
    #[allow(dead_code)]
    rel_type: String,
}

#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: BTreeMap<NodeId, StoredNode>,
    relationships: Vec<Relationship>,
    constraints: BTreeSet<(String, String)>,
    next_id: NodeId,
}

impl GraphState {
    fn find(&self, label: &str, uuid: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.labels.contains(label) && node.has_uuid(uuid))
            .map(|(id, _)| *id)
    }

    fn find_any(&self, uuid: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.has_uuid(uuid))
            .map(|(id, _)| *id)
    }

    fn create(&mut self, labels: BTreeSet<String>, properties: PropertyMap) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, StoredNode { labels, properties });
        id
    }

    fn degree(&self, id: NodeId) -> usize {
        self.relationships
            .iter()
            .filter(|rel| rel.from == id || rel.to == id)
            .count()
    }

    /// Apply one statement, returning its projected rows and counters
    fn apply(&mut self, query: &GraphQuery) -> Result<(Vec<Row>, QueryStats), StoreError> {
        query.validate()?;

        let mut stats = QueryStats::default();
        let mut rows = Vec::new();

        match query {
            GraphQuery::MergeNode {
                merge_label,
                uuid,
                properties,
                labels,
            } => {
                let id = match self.find(merge_label, uuid) {
                    Some(id) => id,
                    None => {
                        let mut initial = PropertyMap::new();
                        initial.insert(UUID_PROPERTY.to_string(), uuid.as_str().into());
                        stats.nodes_created = 1;
                        self.create(BTreeSet::from([merge_label.clone()]), initial)
                    }
                };
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.properties = properties.clone();
                    stats.properties_set = properties.len() as i64;
                    for label in labels {
                        if node.labels.insert(label.clone()) {
                            stats.labels_added += 1;
                        }
                    }
                }
            }
            GraphQuery::StripNode {
                match_label,
                uuid,
                labels,
                properties,
            } => {
                if let Some(node) = self
                    .find(match_label, uuid)
                    .and_then(|id| self.nodes.get_mut(&id))
                {
                    for label in labels {
                        if node.labels.remove(label) {
                            stats.labels_removed += 1;
                        }
                    }
                    node.properties = properties.clone();
                    stats.properties_set = properties.len() as i64;
                }
            }
            GraphQuery::DeleteIfOrphaned { match_label, uuid } => {
                if let Some(id) = self.find(match_label, uuid) {
                    if self.degree(id) == 0 {
                        self.nodes.remove(&id);
                        stats.nodes_deleted = 1;
                    }
                }
            }
            GraphQuery::FetchNode {
                label,
                uuid,
                properties,
            } => {
                for node in self
                    .nodes
                    .values()
                    .filter(|node| node.labels.contains(label) && node.has_uuid(uuid))
                {
                    let mut row = Row::new();
                    for spec in properties {
                        let value = node
                            .properties
                            .get(spec.name)
                            .cloned()
                            .map(Value::from)
                            .unwrap_or(Value::Null);
                        row.insert(spec.name.to_string(), value);
                    }
                    row.insert(
                        LABELS_COLUMN.to_string(),
                        Value::Array(node.labels.iter().cloned().map(Value::String).collect()),
                    );
                    rows.push(row);
                }
            }
            GraphQuery::CountNodes { label } => {
                let count = self
                    .nodes
                    .values()
                    .filter(|node| node.labels.contains(label))
                    .count();
                let mut row = Row::new();
                row.insert(COUNT_COLUMN.to_string(), Value::from(count as i64));
                rows.push(row);
            }
        }

        Ok((rows, stats.with_update_flag()))
    }

    fn check_constraints(&self) -> Result<(), StoreError> {
        for (label, property) in &self.constraints {
            let mut seen = BTreeSet::new();
            for node in self.nodes.values().filter(|n| n.labels.contains(label)) {
                if let Some(value) = node.properties.get(property) {
                    let key = serde_json::to_string(value)
                        .map_err(|e| StoreError::decode(property.as_str(), e.to_string()))?;
                    if !seen.insert(key) {
                        let shown = value.as_text().unwrap_or_default();
                        return Err(StoreError::constraint_violation(
                            label.as_str(),
                            property.as_str(),
                            shown,
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// In-memory labeled property graph
#[derive(Debug)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
    available: AtomicBool,
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the store going away (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable("in-memory graph store is offline"))
        }
    }

    /// Insert a node directly, bypassing the query layer
    pub async fn add_node(&self, labels: &[&str], properties: PropertyMap) {
        let labels = labels.iter().map(|l| l.to_string()).collect();
        self.state.write().await.create(labels, properties);
    }

    /// Create a relationship between the nodes identified by two uuids
    pub async fn relate(
        &self,
        from_uuid: &str,
        to_uuid: &str,
        rel_type: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let from = state
            .find_any(from_uuid)
            .ok_or_else(|| StoreError::query_failed(format!("No node with uuid {}", from_uuid)))?;
        let to = state
            .find_any(to_uuid)
            .ok_or_else(|| StoreError::query_failed(format!("No node with uuid {}", to_uuid)))?;
        state.relationships.push(Relationship {
            from,
            to,
            rel_type: rel_type.to_string(),
        });
        Ok(())
    }

    /// Registered uniqueness constraints as `(label, property)` pairs
    pub async fn constraints(&self) -> Vec<(String, String)> {
        self.state.read().await.constraints.iter().cloned().collect()
    }

    /// Labels of the node with `uuid`, regardless of its labels
    pub async fn node_labels(&self, uuid: &str) -> Option<Vec<String>> {
        let state = self.state.read().await;
        state
            .find_any(uuid)
            .and_then(|id| state.nodes.get(&id))
            .map(|node| node.labels.iter().cloned().collect())
    }

    /// Properties of the node with `uuid`, regardless of its labels
    pub async fn node_properties(&self, uuid: &str) -> Option<PropertyMap> {
        let state = self.state.read().await;
        state
            .find_any(uuid)
            .and_then(|id| state.nodes.get(&id))
            .map(|node| node.properties.clone())
    }

    /// Total number of nodes in the graph
    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn execute_batch(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<StatementResult>, StoreError> {
        self.ensure_available()?;

        let mut state = self.state.write().await;
        let mut working = state.clone();
        let mut results = Vec::with_capacity(statements.len());

        for statement in &statements {
            let (rows, stats) = working.apply(&statement.query)?;
            results.push(StatementResult {
                rows,
                stats: statement.include_stats.then_some(stats),
            });
        }
        working.check_constraints()?;

        *state = working;
        debug!("Applied batch of {} statements", statements.len());
        Ok(results)
    }

    async fn ensure_unique_constraint(
        &self,
        label: &str,
        property: &str,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        quote_identifier(label)?;
        quote_identifier(property)?;

        let mut state = self.state.write().await;
        let mut working = state.clone();
        working
            .constraints
            .insert((label.to_string(), property.to_string()));
        working.check_constraints()?;
        *state = working;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(uuid: &str, pref_label: &str) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert("uuid".to_string(), uuid.into());
        map.insert("prefLabel".to_string(), pref_label.into());
        map
    }

    fn merge(uuid: &str, pref_label: &str) -> GraphQuery {
        GraphQuery::MergeNode {
            merge_label: "Thing".to_string(),
            uuid: uuid.to_string(),
            properties: props(uuid, pref_label),
            labels: vec!["Concept".to_string(), "Series".to_string()],
        }
    }

    fn count(label: &str) -> GraphQuery {
        GraphQuery::CountNodes {
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn test_merge_creates_then_updates() {
        let store = InMemoryGraphStore::new();

        let first = store
            .execute_batch(vec![Statement::with_stats(merge("12345", "Test"))])
            .await
            .unwrap();
        let created = first[0].stats.unwrap();
        assert_eq!(created.nodes_created, 1);
        assert_eq!(created.labels_added, 2);
        assert_eq!(created.properties_set, 2);
        assert!(created.contains_updates);
        assert!(first[0].rows.is_empty());

        let second = store
            .execute_batch(vec![Statement::with_stats(merge("12345", "Updated"))])
            .await
            .unwrap();
        let updated = second[0].stats.unwrap();
        assert_eq!(updated.nodes_created, 0);
        assert_eq!(updated.labels_added, 0);

        assert_eq!(store.node_count().await, 1);
        assert_eq!(
            store.node_properties("12345").await.unwrap()["prefLabel"],
            PropertyValue::from("Updated")
        );
    }

    #[tokio::test]
    async fn test_stats_only_when_requested() {
        let store = InMemoryGraphStore::new();

        let results = store
            .execute_batch(vec![Statement::new(merge("12345", "Test"))])
            .await
            .unwrap();

        assert_eq!(results[0].stats, None);
    }

    #[tokio::test]
    async fn test_strip_and_delete_orphan() {
        let store = InMemoryGraphStore::new();
        store
            .execute_batch(vec![Statement::new(merge("12345", "Test"))])
            .await
            .unwrap();

        let mut uuid_only = PropertyMap::new();
        uuid_only.insert("uuid".to_string(), "12345".into());
        let results = store
            .execute_batch(vec![
                Statement::with_stats(GraphQuery::StripNode {
                    match_label: "Thing".to_string(),
                    uuid: "12345".to_string(),
                    labels: vec!["Concept".to_string(), "Series".to_string()],
                    properties: uuid_only,
                }),
                Statement::with_stats(GraphQuery::DeleteIfOrphaned {
                    match_label: "Thing".to_string(),
                    uuid: "12345".to_string(),
                }),
            ])
            .await
            .unwrap();

        assert_eq!(results[0].stats.unwrap().labels_removed, 2);
        assert_eq!(results[1].stats.unwrap().nodes_deleted, 1);
        assert_eq!(store.node_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_keeps_related_node() {
        let store = InMemoryGraphStore::new();
        store
            .execute_batch(vec![
                Statement::new(merge("12345", "Test")),
                Statement::new(merge("67890", "Other")),
            ])
            .await
            .unwrap();
        store.relate("67890", "12345", "HAS_PARENT").await.unwrap();

        let results = store
            .execute_batch(vec![Statement::with_stats(GraphQuery::DeleteIfOrphaned {
                match_label: "Thing".to_string(),
                uuid: "12345".to_string(),
            })])
            .await
            .unwrap();

        assert_eq!(results[0].stats.unwrap().nodes_deleted, 0);
        assert!(!results[0].stats.unwrap().contains_updates);
        assert_eq!(store.node_count().await, 2);
    }

    #[tokio::test]
    async fn test_fetch_projects_missing_properties_as_null() {
        let store = InMemoryGraphStore::new();
        store
            .execute_batch(vec![Statement::new(merge("12345", "Test"))])
            .await
            .unwrap();

        let results = store
            .execute_batch(vec![Statement::new(GraphQuery::FetchNode {
                label: "Series".to_string(),
                uuid: "12345".to_string(),
                properties: crate::models::SERIES_PROPERTIES.to_vec(),
            })])
            .await
            .unwrap();

        let row = &results[0].rows[0];
        assert_eq!(row["prefLabel"], "Test");
        assert_eq!(row["description"], Value::Null);
        assert_eq!(
            row[LABELS_COLUMN],
            serde_json::json!(["Concept", "Series", "Thing"])
        );
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_trace() {
        let store = InMemoryGraphStore::new();

        let result = store
            .execute_batch(vec![
                Statement::new(merge("12345", "Test")),
                Statement::new(count("Not A Label")),
            ])
            .await;

        assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
        assert_eq!(store.node_count().await, 0);
    }

    #[tokio::test]
    async fn test_uniqueness_constraint_enforced() {
        let store = InMemoryGraphStore::new();
        store.ensure_unique_constraint("Series", "uuid").await.unwrap();
        store.ensure_unique_constraint("Series", "uuid").await.unwrap();
        assert_eq!(store.constraints().await.len(), 1);

        store.add_node(&["Series"], props("12345", "Test")).await;
        store
            .execute_batch(vec![Statement::new(count("Series"))])
            .await
            .unwrap();

        store.add_node(&["Series"], props("12345", "Duplicate")).await;
        let result = store
            .execute_batch(vec![Statement::new(count("Series"))])
            .await;
        assert!(matches!(
            result,
            Err(StoreError::ConstraintViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_offline_store_reports_unavailable() {
        let store = InMemoryGraphStore::new();
        store.set_available(false);

        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(store
            .execute_batch(vec![Statement::new(count("Series"))])
            .await
            .is_err());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}
