//! PostgreSQL Edge Store
//!
//! Production backend:
//! - Connection pooling: PgPool shared by concurrent requests
//! - Array binds (`= ANY($n)`) so one statement covers any filter size
//! - Identifier representation read from the schema once, at connect time

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

use super::CONNECTIVITY_TABLE_NAME;
use crate::domain::models::{CellId, Depth, Edge, FilterSet, IdKind, TimeRange};
use crate::domain::ports::EdgeStore;
use crate::{Result, StoreError};

/// Rows per INSERT ... UNNEST statement
const INSERT_CHUNK_SIZE: usize = 100_000;

/// Declared type of `end_id`, limited to the schema unqualified names resolve to
const ID_KIND_QUERY: &str = "SELECT data_type FROM information_schema.columns
     WHERE table_schema = current_schema() AND table_name = $1 AND column_name = 'end_id'";

/// Pool settings for `PostgresEdgeStore::connect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresSettings {
    /// e.g. "postgres://user:password@db:5432/db"
    pub database_url: String,
    pub table: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl PostgresSettings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            table: CONNECTIVITY_TABLE_NAME.to_string(),
            max_connections: 20,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL Edge Store (Production/Server)
pub struct PostgresEdgeStore {
    /// Connection pool for concurrent requests
    pool: PgPool,
    table: String,
    id_kind: IdKind,
}

impl PostgresEdgeStore {
    /// Connect, then read the identifier representation from the schema
    ///
    /// # Example
    /// ```no_run
    /// use hexconn_storage::{PostgresEdgeStore, PostgresSettings};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let settings = PostgresSettings::new("postgres://localhost/connectivity");
    ///     let store = PostgresEdgeStore::connect(&settings).await.unwrap();
    ///     store.close_pool().await;
    /// }
    /// ```
    pub async fn connect(settings: &PostgresSettings) -> Result<Self> {
        validate_table_name(&settings.table)?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&settings.database_url)
            .await
            .map_err(|e| {
                StoreError::database(format!("Failed to connect to PostgreSQL: {}", e))
                    .with_source(e)
            })?;

        let id_kind = Self::detect_id_kind(&pool, &settings.table).await?;
        tracing::info!(table = %settings.table, id_kind = id_kind.as_str(), "connected to PostgreSQL");

        Ok(Self {
            pool,
            table: settings.table.clone(),
            id_kind,
        })
    }

    /// Create the edge table and its covering lookup index if missing
    ///
    /// The index matches the fetch predicate: (depth, time_range, start_id)
    /// with end_id and weight included for index-only scans.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                start_id INTEGER NOT NULL,
                end_id INTEGER NOT NULL,
                time_range TEXT NOT NULL,
                depth TEXT NOT NULL,
                weight DOUBLE PRECISION NOT NULL
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_connect_dtr_inc
             ON {} (depth, time_range, start_id)
             INCLUDE (end_id, weight)",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!("ANALYZE {}", self.table))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get connection pool reference (for advanced usage)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close connection pool gracefully
    pub async fn close_pool(&self) {
        self.pool.close().await;
    }

    async fn detect_id_kind(pool: &PgPool, table: &str) -> Result<IdKind> {
        let data_type: Option<String> = sqlx::query_scalar(ID_KIND_QUERY)
            .bind(table)
            .fetch_optional(pool)
            .await?;

        // Missing table: ensure_schema will create integer columns
        Ok(match data_type.as_deref() {
            Some("text") | Some("character varying") | Some("character") => IdKind::Text,
            _ => IdKind::Numeric,
        })
    }

    /// Helper: Convert PgRow to Edge
    fn row_to_edge(row: &PgRow) -> Result<Edge> {
        let start_id: i64 = row
            .try_get("start_id")
            .map_err(|e| StoreError::decode(format!("Missing start_id: {}", e)))?;
        let end_id: i64 = row
            .try_get("end_id")
            .map_err(|e| StoreError::decode(format!("Missing end_id: {}", e)))?;
        let depth: String = row
            .try_get("depth")
            .map_err(|e| StoreError::decode(format!("Missing depth: {}", e)))?;
        let time_range: String = row
            .try_get("time_range")
            .map_err(|e| StoreError::decode(format!("Missing time_range: {}", e)))?;
        let weight: f64 = row
            .try_get("weight")
            .map_err(|e| StoreError::decode(format!("Missing weight: {}", e)))?;

        Ok(Edge {
            origin_id: CellId::new(start_id)
                .ok_or_else(|| StoreError::decode(format!("Non-positive start_id {}", start_id)))?,
            destination_id: CellId::new(end_id)
                .ok_or_else(|| StoreError::decode(format!("Non-positive end_id {}", end_id)))?,
            depth: depth.parse::<Depth>().map_err(StoreError::decode)?,
            time_range: time_range.parse::<TimeRange>().map_err(StoreError::decode)?,
            weight,
        })
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::config(format!("Invalid table name '{}'", table)))
    }
}

#[async_trait]
impl EdgeStore for PostgresEdgeStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    async fn fetch_edges(&self, filters: &FilterSet) -> Result<Vec<Edge>> {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        let depths: Vec<String> = filters.depths.iter().map(|d| d.to_string()).collect();
        let times: Vec<String> = filters.time_ranges.iter().map(|t| t.to_string()).collect();

        // Ids compare in the column's own type so the lookup index stays usable
        let rows = match self.id_kind {
            IdKind::Numeric => {
                let origins: Vec<i64> = filters.origin_ids.iter().map(|o| o.get()).collect();
                sqlx::query(&format!(
                    "SELECT start_id::BIGINT AS start_id, end_id::BIGINT AS end_id,
                            time_range, depth, weight
                     FROM {}
                     WHERE depth = ANY($1) AND time_range = ANY($2) AND start_id = ANY($3)",
                    self.table
                ))
                .bind(depths)
                .bind(times)
                .bind(origins)
                .fetch_all(&self.pool)
                .await?
            }
            IdKind::Text => {
                let origins: Vec<String> =
                    filters.origin_ids.iter().map(|o| o.to_string()).collect();
                sqlx::query(&format!(
                    "SELECT start_id::BIGINT AS start_id, end_id::BIGINT AS end_id,
                            time_range, depth, weight
                     FROM {}
                     WHERE depth = ANY($1) AND time_range = ANY($2) AND start_id = ANY($3)",
                    self.table
                ))
                .bind(depths)
                .bind(times)
                .bind(origins)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let edges = rows
            .iter()
            .map(Self::row_to_edge)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rows = edges.len(), "postgres fetch_edges");
        Ok(edges)
    }

    async fn insert_edges(&self, edges: &[Edge]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for chunk in edges.chunks(INSERT_CHUNK_SIZE) {
            let start_ids: Vec<i64> = chunk.iter().map(|e| e.origin_id.get()).collect();
            let end_ids: Vec<i64> = chunk.iter().map(|e| e.destination_id.get()).collect();
            let times: Vec<String> = chunk.iter().map(|e| e.time_range.to_string()).collect();
            let depths: Vec<String> = chunk.iter().map(|e| e.depth.to_string()).collect();
            let weights: Vec<f64> = chunk.iter().map(|e| e.weight).collect();

            let cast = match self.id_kind {
                IdKind::Numeric => "BIGINT",
                IdKind::Text => "TEXT",
            };

            sqlx::query(&format!(
                "INSERT INTO {table} (start_id, end_id, time_range, depth, weight)
                 SELECT s::{cast}, e::{cast}, t, d, w
                 FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::TEXT[], $4::TEXT[], $5::FLOAT8[])
                      AS u(s, e, t, d, w)",
                table = self.table,
            ))
            .bind(start_ids)
            .bind(end_ids)
            .bind(times)
            .bind(depths)
            .bind(weights)
            .execute(&mut *tx)
            .await?;

            tracing::debug!(rows = chunk.len(), "postgres insert chunk");
        }

        tx.commit().await?;
        Ok(edges.len())
    }

    async fn edge_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn close(&self) {
        self.close_pool().await;
    }
}
