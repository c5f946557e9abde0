//! Edge Store Port (Trait Interface)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Development: SQLite (zero-config)
//! - Production: PostgreSQL
//! - Testing: InMemory

use async_trait::async_trait;

use super::models::{Edge, FilterSet, IdKind};
use crate::Result;

/// Edge Store Port (Primary Interface)
///
/// The pipeline only ever reads through `fetch_edges`. Loading and counting
/// exist for the data loader and operator tooling.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Short backend label for logs ("memory", "sqlite", "postgres")
    fn backend_name(&self) -> &'static str;

    /// Identifier representation fixed by this store's schema
    fn id_kind(&self) -> IdKind;

    /// Fetch every edge whose origin, depth and time range are each members
    /// of the corresponding filter set
    ///
    /// Returns an empty vec, never an error, when nothing matches.
    async fn fetch_edges(&self, filters: &FilterSet) -> Result<Vec<Edge>>;

    /// Append edges, returning the number written
    async fn insert_edges(&self, edges: &[Edge]) -> Result<usize>;

    /// Total number of stored edges
    async fn edge_count(&self) -> Result<u64>;

    /// Release pooled connections (no-op for embedded backends)
    async fn close(&self) {}
}
