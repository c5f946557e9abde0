//! hexconn-storage - Edge Store for Larval Connectivity
//!
//! Holds directed, weighted dispersal edges keyed by
//! `(origin, destination, depth, time_range)` and answers one question for
//! the aggregation pipeline: which edges match a set-membership filter.
//!
//! ## Backends
//!
//! - `InMemoryEdgeStore`: tests and demos
//! - `SqliteEdgeStore` (`sqlite` feature): local files
//! - `PostgresEdgeStore` (`postgres` feature): production database
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hexconn_storage::{EdgeStore, FilterSet, Depth, TimeRange, CellId};
//!
//! let filters = FilterSet::new([Depth::M05], [TimeRange::D00To07], CellId::new(42));
//! let edges = store.fetch_edges(&filters).await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StoreError};

pub use domain::{CellId, Depth, Edge, EdgeRecord, EdgeStore, FilterSet, IdKind, TimeRange};

pub use infrastructure::InMemoryEdgeStore;

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteEdgeStore;

#[cfg(feature = "postgres")]
pub use infrastructure::{PostgresEdgeStore, PostgresSettings};
