//! hexconn - larval connectivity CLI
//!
//! # Usage
//!
//! ```bash
//! # Normalized connectivity from two origin cells
//! hexconn query --depth 05m,10m --time-range 00d-07d --origin-ids 42,43
//!
//! # Load exported edges into the configured store
//! hexconn --config hexconn.yaml load --input edges.json --ensure-schema
//!
//! # Backend, identifier kind and edge count
//! hexconn stats
//! ```
//!
//! `query` prints the JSON payload on stdout (exit 0) or a JSON error body
//! (exit 2 validation, 3 not found, 4 store, 5 numeric domain). Logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hexconn_core::storage::{Edge, EdgeRecord, EdgeStore};
use hexconn_core::{open_store, ConnectivityPipeline, ErrorBody, RawFilterParams, ServiceConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexconn")]
#[command(about = "Hexagonal-grid larval connectivity queries", long_about = None)]
struct Cli {
    /// YAML configuration file (defaults plus environment when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalized connectivity for a filter set
    Query {
        /// Depth bands, comma separated (05m, 10m, 15m)
        #[arg(long)]
        depth: String,

        /// Time bands, comma separated (00d-07d, 07d-14d, 14d-28d)
        #[arg(long)]
        time_range: String,

        /// Origin cell ids, comma separated
        #[arg(long, alias = "start-id")]
        origin_ids: String,

        /// Aggregation operator (configured default when omitted)
        #[arg(long)]
        aggregate: Option<String>,
    },

    /// Insert edges from a JSON array of {start_id, end_id, time, depth, weight}
    Load {
        #[arg(short, long)]
        input: PathBuf,

        /// Create the table and index first (postgres)
        #[arg(long)]
        ensure_schema: bool,
    },

    /// Show backend, identifier kind and edge count
    Stats,

    /// Show the effective configuration
    Config {
        /// Print as YAML
        #[arg(long)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ServiceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Query {
            depth,
            time_range,
            origin_ids,
            aggregate,
        } => {
            let mut raw = RawFilterParams::new(depth, time_range, origin_ids);
            raw.aggregate = aggregate;
            query(&config, &raw).await
        }
        Commands::Load {
            input,
            ensure_schema,
        } => {
            load(&config, &input, ensure_schema).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats => {
            stats(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { print } => {
            if print {
                print!("{}", config.to_yaml()?);
            } else {
                println!("Configuration is valid (backend: {})", config.store.backend.as_str());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn query(config: &ServiceConfig, raw: &RawFilterParams) -> Result<ExitCode> {
    let pipeline = ConnectivityPipeline::new(config.to_pipeline_config());

    // Malformed filters never reach the store, not even to connect
    let request = match pipeline.config().validator.validate(raw) {
        Ok(request) => request,
        Err(e) => return emit_error(&e.into()),
    };

    let store = match open_store(&config.store).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open edge store");
            return emit_error(&e.into());
        }
    };

    let outcome = pipeline.run_request(store.as_ref(), &request).await;
    store.close().await;

    match outcome {
        Ok(payload) => {
            println!("{}", payload.to_json()?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => emit_error(&e),
    }
}

fn emit_error(err: &hexconn_core::ConnectivityError) -> Result<ExitCode> {
    println!("{}", ErrorBody::from_error(err).to_json()?);
    // Exit codes are small positive constants
    Ok(ExitCode::from(err.kind().exit_code() as u8))
}

async fn load(config: &ServiceConfig, input: &Path, ensure_schema: bool) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let records: Vec<EdgeRecord> =
        serde_json::from_str(&content).context("Input must be a JSON array of edge records")?;

    let edges = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            Edge::try_from(record).map_err(|e| anyhow::anyhow!("Record {}: {}", i, e))
        })
        .collect::<Result<Vec<_>>>()?;

    if ensure_schema {
        prepare_schema(config).await?;
    }
    let store = open_store(&config.store).await?;

    let written = store.insert_edges(&edges).await?;
    info!(
        backend = store.backend_name(),
        written,
        "loaded edges from {}",
        input.display()
    );
    println!("Inserted {} edges", written);

    store.close().await;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn prepare_schema(config: &ServiceConfig) -> Result<()> {
    use hexconn_core::StoreBackend;

    // Embedded backends create their schema on open
    if config.store.backend != StoreBackend::Postgres {
        return Ok(());
    }
    let url = config
        .store
        .database_url
        .as_deref()
        .context("No database URL configured")?;
    let mut settings = hexconn_core::storage::PostgresSettings::new(url);
    settings.table = config.store.table.clone();
    settings.min_connections = 0;
    settings.max_connections = 1;

    let store = hexconn_core::storage::PostgresEdgeStore::connect(&settings).await?;
    store.ensure_schema().await?;
    store.close().await;
    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn prepare_schema(_config: &ServiceConfig) -> Result<()> {
    Ok(())
}

async fn stats(config: &ServiceConfig) -> Result<()> {
    let store: Box<dyn EdgeStore> = open_store(&config.store).await?;
    let count = store.edge_count().await?;

    println!("backend:  {}", store.backend_name());
    println!("id_kind:  {}", store.id_kind().as_str());
    println!("edges:    {}", count);

    store.close().await;
    Ok(())
}
