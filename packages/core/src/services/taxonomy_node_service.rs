//! Taxonomy Node Service - Series concept persistence
//!
//! This module maps `Series` entities onto labeled nodes in the concept graph:
//!
//! - `write` upserts a node under `Thing`, replacing its whole property set
//!   and applying the taxonomy labels
//! - `read` projects a node carrying the service's kind label back into an entity
//! - `delete` strips taxonomy labels and properties, then purges the node if
//!   nothing else refers to it
//! - `count`, `check` and `initialise` support health checks and startup
//!
//! One service instance serves one `TaxonomyKind`; the `Series` and
//! `AlphavilleSeries` taxonomies share every code path and differ only in
//! their most specific label.

use crate::db::{GraphQuery, GraphStore, Row, Statement, StoreError, COUNT_COLUMN, LABELS_COLUMN};
use crate::models::{
    PropertyMap, PropertyValue, Series, TaxonomyKind, SERIES_PROPERTIES, THING_LABEL,
    UUID_PROPERTY,
};
use crate::services::error::TaxonomyServiceError;
use crate::utils::same_members;
use std::io::Read;
use std::sync::Arc;
use tracing::instrument;

/// Reads and writes taxonomy concept nodes of one kind
///
/// Holds no mutable state; clone it or share it behind `Arc` freely.
#[derive(Clone)]
pub struct TaxonomyNodeService {
    store: Arc<dyn GraphStore>,
    kind: TaxonomyKind,
}

impl std::fmt::Debug for TaxonomyNodeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyNodeService")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl TaxonomyNodeService {
    /// Create a service for `kind` over `store`
    ///
    /// # Examples
    ///
    /// ```
    /// # use series_rw_core::db::InMemoryGraphStore;
    /// # use series_rw_core::models::{Series, TaxonomyKind};
    /// # use series_rw_core::services::TaxonomyNodeService;
    /// # use std::sync::Arc;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let service = TaxonomyNodeService::new(
    ///     Arc::new(InMemoryGraphStore::new()),
    ///     TaxonomyKind::Series,
    /// );
    ///
    /// service.write(&Series::new("12345").with_pref_label("Test")).await?;
    /// let series = service.read("12345").await?.expect("written above");
    /// assert_eq!(series.pref_label.as_deref(), Some("Test"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(store: Arc<dyn GraphStore>, kind: TaxonomyKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> TaxonomyKind {
        self.kind
    }

    /// Get access to the underlying graph store
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Ensure `uuid` is unique for every label a concept node of this kind carries
    ///
    /// Safe to call on every startup; existing constraints are left in place.
    ///
    /// # Errors
    ///
    /// Returns the store's error if any constraint cannot be created. Callers
    /// should treat this as fatal.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn initialise(&self) -> Result<(), TaxonomyServiceError> {
        for label in self.kind.labels() {
            self.store
                .ensure_unique_constraint(label, UUID_PROPERTY)
                .await?;
        }
        tracing::info!("Ensured uuid constraints for {} taxonomy", self.kind);
        Ok(())
    }

    /// Upsert `series` as a node of this service's kind
    ///
    /// The stored property set is replaced wholesale: a field left empty in
    /// `series` is removed from the node even if an earlier write set it.
    ///
    /// # Errors
    ///
    /// * `InvalidEntity` - `uuid` is blank
    /// * `Store` - the store rejected or failed the statement
    #[instrument(skip(self, series), fields(kind = %self.kind, uuid = %series.uuid))]
    pub async fn write(&self, series: &Series) -> Result<(), TaxonomyServiceError> {
        series.validate()?;

        let query = GraphQuery::MergeNode {
            merge_label: THING_LABEL.to_string(),
            uuid: series.uuid.clone(),
            properties: series.to_properties(),
            labels: self.taxonomy_labels(),
        };
        self.store.execute_batch(vec![Statement::new(query)]).await?;

        tracing::debug!("Wrote {} {}", self.kind, series.uuid);
        Ok(())
    }

    /// Fetch the node with `uuid` carrying this service's kind label
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Series))` - node found; `types` lists its labels in canonical order
    /// * `Ok(None)` - no such node of this kind
    /// * `Err` - the store failed, or the node could not be mapped onto an entity
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn read(&self, uuid: &str) -> Result<Option<Series>, TaxonomyServiceError> {
        let query = GraphQuery::FetchNode {
            label: self.kind.label().to_string(),
            uuid: uuid.to_string(),
            properties: SERIES_PROPERTIES.to_vec(),
        };
        let results = self.store.execute_batch(vec![Statement::new(query)]).await?;

        let Some(row) = results.into_iter().next().and_then(|r| r.rows.into_iter().next()) else {
            return Ok(None);
        };

        let (properties, labels) = decode_node_row(row)?;
        if !same_members(&labels, &self.kind.labels()) {
            tracing::warn!(
                "Node {} has labels {:?}, expected {:?}",
                uuid,
                labels,
                self.kind.labels()
            );
        }

        let series = Series::from_properties(&properties, &labels, self.kind)?;
        Ok(Some(series))
    }

    /// Remove the node with `uuid` from this taxonomy
    ///
    /// Strips the taxonomy labels and every property but `uuid` in one atomic
    /// batch, then deletes the node if it has no relationships left. A node
    /// still referenced by others survives as a bare `Thing` and no longer
    /// reads or counts as this kind.
    ///
    /// # Returns
    ///
    /// `true` if a labeled node was found and stripped, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or `StoreError::MissingStats` if the store
    /// did not report what the strip statement changed.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete(&self, uuid: &str) -> Result<bool, TaxonomyServiceError> {
        let mut uuid_only = PropertyMap::new();
        uuid_only.insert(UUID_PROPERTY.to_string(), PropertyValue::from(uuid));

        let statements = vec![
            Statement::with_stats(GraphQuery::StripNode {
                match_label: THING_LABEL.to_string(),
                uuid: uuid.to_string(),
                labels: self.taxonomy_labels(),
                properties: uuid_only,
            }),
            Statement::new(GraphQuery::DeleteIfOrphaned {
                match_label: THING_LABEL.to_string(),
                uuid: uuid.to_string(),
            }),
        ];
        let results = self.store.execute_batch(statements).await?;

        let stats = results
            .first()
            .and_then(|result| result.stats)
            .ok_or(StoreError::MissingStats { index: 0 })?;
        let found = stats.contains_updates && stats.labels_removed > 0;

        tracing::info!("Delete of {} {}: found={}", self.kind, uuid, found);
        Ok(found)
    }

    /// Number of nodes carrying this service's kind label
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn count(&self) -> Result<i64, TaxonomyServiceError> {
        let query = GraphQuery::CountNodes {
            label: self.kind.label().to_string(),
        };
        let results = self.store.execute_batch(vec![Statement::new(query)]).await?;

        let count = results
            .first()
            .and_then(|result| result.rows.first())
            .and_then(|row| row.get(COUNT_COLUMN))
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| StoreError::decode(COUNT_COLUMN, "count query returned no value"))?;
        Ok(count)
    }

    /// Verify the store is reachable
    pub async fn check(&self) -> Result<(), TaxonomyServiceError> {
        self.store.ping().await?;
        Ok(())
    }

    /// Decode one JSON entity from `reader`
    ///
    /// # Returns
    ///
    /// The entity together with its `uuid`, so callers can compare it with
    /// the identity the entity was submitted under.
    ///
    /// # Errors
    ///
    /// * `Io` - the reader failed
    /// * `Decode` - the body is not a valid entity document
    pub fn decode_json<R: Read>(
        &self,
        mut reader: R,
    ) -> Result<(Series, String), TaxonomyServiceError> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        let series: Series = serde_json::from_slice(&body)?;
        let uuid = series.uuid.clone();
        Ok((series, uuid))
    }

    fn taxonomy_labels(&self) -> Vec<String> {
        self.kind
            .taxonomy_labels()
            .iter()
            .map(|label| label.to_string())
            .collect()
    }
}

/// Split a fetched row into stored properties and node labels
fn decode_node_row(mut row: Row) -> Result<(PropertyMap, Vec<String>), StoreError> {
    let labels = match row.remove(LABELS_COLUMN) {
        Some(value) => serde_json::from_value::<Vec<String>>(value)
            .map_err(|e| StoreError::decode(LABELS_COLUMN, e.to_string()))?,
        None => Vec::new(),
    };

    let mut properties = PropertyMap::new();
    for (name, value) in row {
        if value.is_null() {
            continue;
        }
        let property = serde_json::from_value::<PropertyValue>(value)
            .map_err(|e| StoreError::decode(name.as_str(), e.to_string()))?;
        properties.insert(name, property);
    }

    Ok((properties, labels))
}
