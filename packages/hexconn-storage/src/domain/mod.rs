//! Domain layer: connectivity models and the edge store port

pub mod models;
pub mod ports;

pub use models::{CellId, Depth, Edge, EdgeRecord, FilterSet, IdKind, TimeRange};
pub use ports::EdgeStore;
