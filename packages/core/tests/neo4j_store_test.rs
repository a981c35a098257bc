//! Neo4j Store Tests
//!
//! Runs the taxonomy service against a live Neo4j server. Skipped unless
//! `NEO4J_TEST_URL` is set, e.g.
//!
//! ```text
//! NEO4J_TEST_URL=bolt://localhost:7687 NEO4J_PASSWORD=secret cargo test -p series-rw-core
//! ```
//!
//! Every test works on fresh random uuids and removes its nodes afterwards.

#[cfg(all(test, feature = "neo4j"))]
mod neo4j_store_tests {
    use anyhow::Result;
    use series_rw_core::db::{GraphStore, Neo4jStore};
    use series_rw_core::models::{AlternativeIdentifiers, Series, TaxonomyKind};
    use series_rw_core::services::TaxonomyNodeService;
    use series_rw_core::StoreConfig;
    use std::sync::Arc;

    /// Connect to the test server, or `None` when no server is configured
    async fn connect() -> Result<Option<Arc<dyn GraphStore>>> {
        let Ok(url) = std::env::var("NEO4J_TEST_URL") else {
            eprintln!("NEO4J_TEST_URL not set, skipping");
            return Ok(None);
        };
        let mut config = StoreConfig::from_env().map_err(anyhow::Error::msg)?;
        config.uri = url;

        let store = Neo4jStore::connect(&config).await?;
        Ok(Some(Arc::new(store)))
    }

    fn fresh_uuid() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn test_round_trip_update_and_delete() -> Result<()> {
        let Some(store) = connect().await? else {
            return Ok(());
        };
        let service = TaxonomyNodeService::new(store, TaxonomyKind::Series);
        service.initialise().await?;
        service.check().await?;

        let uuid = fresh_uuid();
        let written = Series::new(&uuid)
            .with_pref_label("Test 'special chars")
            .with_tme_identifier("TME_ID")
            .with_alternative_identifiers(AlternativeIdentifiers {
                tme: vec!["TME_ID".to_string()],
                uuids: vec![uuid.clone()],
            });

        service.write(&written).await?;
        let read = service.read(&uuid).await?.expect("series should exist");
        assert_eq!(read, written.clone().classified(TaxonomyKind::Series));

        service
            .write(&Series::new(&uuid).with_pref_label("Updated"))
            .await?;
        let read = service.read(&uuid).await?.expect("series should exist");
        assert_eq!(read.pref_label.as_deref(), Some("Updated"));
        assert_eq!(read.tme_identifier, None);
        assert_eq!(read.alternative_identifiers, None);

        assert!(service.delete(&uuid).await?);
        assert!(!service.delete(&uuid).await?);
        assert_eq!(service.read(&uuid).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_kind_isolation() -> Result<()> {
        let Some(store) = connect().await? else {
            return Ok(());
        };
        let series = TaxonomyNodeService::new(store.clone(), TaxonomyKind::Series);
        let alphaville = TaxonomyNodeService::new(store, TaxonomyKind::AlphavilleSeries);

        let uuid = fresh_uuid();
        alphaville.write(&Series::new(&uuid).with_pref_label("Test")).await?;

        assert!(alphaville.count().await? >= 1);
        assert_eq!(series.read(&uuid).await?, None);
        assert!(alphaville.read(&uuid).await?.is_some());

        assert!(alphaville.delete(&uuid).await?);
        Ok(())
    }
}
