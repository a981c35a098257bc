//! Series Taxonomy Operator CLI
//!
//! Drives `TaxonomyNodeService` against the Neo4j instance described by the
//! `NEO4J_*` environment variables. Results are printed as JSON on stdout;
//! logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Create uniqueness constraints (safe to repeat)
//! series-rw --kind alphaville-series init
//!
//! # Upsert from a JSON document
//! echo '{"uuid":"12345","prefLabel":"Test"}' | series-rw write --uuid 12345
//!
//! series-rw read 12345
//! series-rw delete 12345
//! series-rw count
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use series_rw_core::db::Neo4jStore;
use series_rw_core::models::TaxonomyKind;
use series_rw_core::services::{TaxonomyNodeService, TaxonomyServiceError};
use series_rw_core::StoreConfig;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "series-rw")]
#[command(about = "Read and write series taxonomy concepts in Neo4j")]
#[command(version)]
struct Cli {
    /// Taxonomy to operate on: series or alphaville-series
    #[arg(long, global = true, env = "SERIES_KIND", default_value = "series")]
    kind: TaxonomyKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure uuid uniqueness constraints exist
    Init,
    /// Verify the database is reachable
    Check,
    /// Count stored concepts of the selected kind
    Count,
    /// Print the concept with the given uuid
    Read {
        uuid: String,
    },
    /// Upsert a concept read as JSON from stdin
    Write {
        /// Reject the body unless its uuid matches
        #[arg(long)]
        uuid: Option<String>,
    },
    /// Remove the concept with the given uuid
    Delete {
        uuid: String,
    },
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StoreConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Invalid NEO4J_* configuration")?;
    let store = Neo4jStore::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.uri))?;
    let service = TaxonomyNodeService::new(Arc::new(store), cli.kind);

    match cli.command {
        Commands::Init => {
            service
                .initialise()
                .await
                .context("Failed to create constraints")?;
            print_json(&json!({ "kind": cli.kind.label(), "initialised": true }))
        }
        Commands::Check => {
            service.check().await.context("Database check failed")?;
            print_json(&json!({ "status": "ok" }))
        }
        Commands::Count => {
            let count = service.count().await?;
            print_json(&json!({ "kind": cli.kind.label(), "count": count }))
        }
        Commands::Read { uuid } => match service.read(&uuid).await? {
            Some(series) => print_json(&serde_json::to_value(&series)?),
            None => anyhow::bail!("No {} with uuid {}", cli.kind, uuid),
        },
        Commands::Write { uuid } => {
            let (series, body_uuid) = service
                .decode_json(std::io::stdin().lock())
                .context("Failed to decode entity from stdin")?;
            if let Some(expected) = uuid {
                if expected != body_uuid {
                    return Err(TaxonomyServiceError::uuid_mismatch(expected, body_uuid).into());
                }
            }
            service.write(&series).await?;
            tracing::info!("Wrote {} {}", cli.kind, body_uuid);
            print_json(&json!({ "uuid": body_uuid, "written": true }))
        }
        Commands::Delete { uuid } => {
            let deleted = service.delete(&uuid).await?;
            print_json(&json!({ "uuid": uuid, "deleted": deleted }))
        }
    }
}
