//! In-Memory Edge Store (for testing)
//!
//! Vec-backed implementation for unit tests and demos.
//! Linear scan per query; NOT for production datasets.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::domain::models::{Edge, FilterSet, IdKind};
use crate::domain::ports::EdgeStore;
use crate::Result;

#[derive(Clone)]
pub struct InMemoryEdgeStore {
    edges: Arc<RwLock<Vec<Edge>>>,
    id_kind: IdKind,
}

impl InMemoryEdgeStore {
    pub fn new() -> Self {
        Self::with_id_kind(IdKind::Numeric)
    }

    /// Store whose identifiers render as `id_kind`
    pub fn with_id_kind(id_kind: IdKind) -> Self {
        Self {
            edges: Arc::new(RwLock::new(Vec::new())),
            id_kind,
        }
    }

    /// Store pre-populated with `edges`
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.edges.write() {
            guard.extend(edges);
        }
        store
    }
}

impl Default for InMemoryEdgeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EdgeStore for InMemoryEdgeStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    async fn fetch_edges(&self, filters: &FilterSet) -> Result<Vec<Edge>> {
        Ok(self
            .edges
            .read()?
            .iter()
            .filter(|e| filters.matches(e))
            .copied()
            .collect())
    }

    async fn insert_edges(&self, edges: &[Edge]) -> Result<usize> {
        self.edges.write()?.extend_from_slice(edges);
        Ok(edges.len())
    }

    async fn edge_count(&self) -> Result<u64> {
        Ok(self.edges.read()?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CellId, Depth, TimeRange};

    fn cell(id: i64) -> CellId {
        CellId::new(id).unwrap()
    }

    fn sample_edges() -> Vec<Edge> {
        vec![
            Edge::new(cell(42), cell(1), Depth::M05, TimeRange::D00To07, 10.0),
            Edge::new(cell(42), cell(2), Depth::M05, TimeRange::D00To07, 10.0),
            Edge::new(cell(42), cell(1), Depth::M10, TimeRange::D00To07, 30.0),
            Edge::new(cell(43), cell(3), Depth::M05, TimeRange::D07To14, 5.0),
        ]
    }

    #[tokio::test]
    async fn test_fetch_filters_each_dimension() {
        let store = InMemoryEdgeStore::from_edges(sample_edges());

        let filters = FilterSet::new([Depth::M05], [TimeRange::D00To07], [cell(42)]);
        let edges = store.fetch_edges(&filters).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.depth == Depth::M05));

        let filters = FilterSet::new(
            [Depth::M05, Depth::M10],
            [TimeRange::D00To07, TimeRange::D07To14],
            [cell(42), cell(43)],
        );
        assert_eq!(store.fetch_edges(&filters).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_no_match_is_empty() {
        let store = InMemoryEdgeStore::from_edges(sample_edges());
        let filters = FilterSet::new([Depth::M15], [TimeRange::D14To28], [cell(42)]);

        assert!(store.fetch_edges(&filters).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = InMemoryEdgeStore::new();
        assert_eq!(store.edge_count().await.unwrap(), 0);

        let written = store.insert_edges(&sample_edges()).await.unwrap();
        assert_eq!(written, 4);
        assert_eq!(store.edge_count().await.unwrap(), 4);
    }

    #[test]
    fn test_declared_id_kind() {
        assert_eq!(InMemoryEdgeStore::new().id_kind(), IdKind::Numeric);
        assert_eq!(
            InMemoryEdgeStore::with_id_kind(IdKind::Text).id_kind(),
            IdKind::Text
        );
    }
}
