//! Infrastructure layer - Edge store adapters

pub mod memory_store;
pub use memory_store::InMemoryEdgeStore;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteEdgeStore;

#[cfg(feature = "postgres")]
pub mod postgres_store;
#[cfg(feature = "postgres")]
pub use postgres_store::{PostgresEdgeStore, PostgresSettings};

/// Default edge table name, shared by the SQL backends
pub const CONNECTIVITY_TABLE_NAME: &str = "connectivity_table";
