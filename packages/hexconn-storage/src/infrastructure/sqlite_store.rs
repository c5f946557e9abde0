//! SQLite Edge Store
//!
//! File-based persistent storage using SQLite.
//! Suitable for local development and testing.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, types::Value, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::CONNECTIVITY_TABLE_NAME;
use crate::domain::models::{CellId, Depth, Edge, FilterSet, IdKind, TimeRange};
use crate::domain::ports::EdgeStore;
use crate::{Result, StoreError};

/// SQLite-based EdgeStore implementation
#[derive(Clone)]
pub struct SqliteEdgeStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEdgeStore {
    /// Open (or create) a store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock()?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {CONNECTIVITY_TABLE_NAME} (
                    start_id INTEGER NOT NULL,
                    end_id INTEGER NOT NULL,
                    time_range TEXT NOT NULL,
                    depth TEXT NOT NULL,
                    weight REAL NOT NULL
                )"
            ),
            [],
        )?;

        // Lookup index: every fetch filters on these three columns
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_connect_dtr
                 ON {CONNECTIVITY_TABLE_NAME}(depth, time_range, start_id)"
            ),
            [],
        )?;

        Ok(())
    }

    /// `?, ?, ?` for `n` parameters
    fn placeholders(n: usize) -> String {
        vec!["?"; n].join(", ")
    }
}

fn decode_row(
    start_id: i64,
    end_id: i64,
    time_range: &str,
    depth: &str,
    weight: f64,
) -> Result<Edge> {
    let origin_id = CellId::new(start_id)
        .ok_or_else(|| StoreError::decode(format!("Non-positive start_id {}", start_id)))?;
    let destination_id = CellId::new(end_id)
        .ok_or_else(|| StoreError::decode(format!("Non-positive end_id {}", end_id)))?;
    let depth = depth.parse::<Depth>().map_err(StoreError::decode)?;
    let time_range = time_range.parse::<TimeRange>().map_err(StoreError::decode)?;

    Ok(Edge::new(origin_id, destination_id, depth, time_range, weight))
}

#[async_trait]
impl EdgeStore for SqliteEdgeStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn id_kind(&self) -> IdKind {
        IdKind::Numeric
    }

    async fn fetch_edges(&self, filters: &FilterSet) -> Result<Vec<Edge>> {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT start_id, end_id, time_range, depth, weight
             FROM {CONNECTIVITY_TABLE_NAME}
             WHERE depth IN ({}) AND time_range IN ({}) AND start_id IN ({})",
            Self::placeholders(filters.depths.len()),
            Self::placeholders(filters.time_ranges.len()),
            Self::placeholders(filters.origin_ids.len()),
        );

        let bind: Vec<Value> = filters
            .depths
            .iter()
            .map(|d| Value::Text(d.as_str().to_string()))
            .chain(
                filters
                    .time_ranges
                    .iter()
                    .map(|t| Value::Text(t.as_str().to_string())),
            )
            .chain(filters.origin_ids.iter().map(|o| Value::Integer(o.get())))
            .collect();

        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            let (start_id, end_id, time_range, depth, weight) = row?;
            edges.push(decode_row(start_id, end_id, &time_range, &depth, weight)?);
        }

        tracing::debug!(rows = edges.len(), "sqlite fetch_edges");
        Ok(edges)
    }

    async fn insert_edges(&self, edges: &[Edge]) -> Result<usize> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {CONNECTIVITY_TABLE_NAME} (start_id, end_id, time_range, depth, weight)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))?;
            for edge in edges {
                stmt.execute(params![
                    edge.origin_id.get(),
                    edge.destination_id.get(),
                    edge.time_range.as_str(),
                    edge.depth.as_str(),
                    edge.weight,
                ])?;
            }
        }
        tx.commit()?;
        Ok(edges.len())
    }

    async fn edge_count(&self) -> Result<u64> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {CONNECTIVITY_TABLE_NAME}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
