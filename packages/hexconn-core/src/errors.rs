//! Error types for the connectivity pipeline
//!
//! Four mutually exclusive failure outcomes per request:
//! - `Validation`: malformed filter input, rejected before any store access
//! - `NotFound`: well-formed filters that matched zero edges
//! - `Store`: store unreachable, faulted or timed out (details stay server-side)
//! - `NumericDomain`: a weight the log-ratio normalizer cannot take

use hexconn_storage::{CellId, FilterSet, StoreError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════════════════════

/// Request field a validation error points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Depth,
    TimeRange,
    OriginIds,
    Aggregate,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Depth => "depth",
            FilterField::TimeRange => "time_range",
            FilterField::OriginIds => "origin_ids",
            FilterField::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint a filter list violated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("list is empty")]
    Empty,

    #[error("list has {found} values, limit is {limit}")]
    TooMany { limit: usize, found: usize },

    #[error("'{value}' is not a supported value")]
    InvalidMember { value: String },

    #[error("'{value}' is not a positive integer id")]
    NonPositiveId { value: String },

    #[error("unknown aggregation operator '{value}'")]
    UnknownOperator { value: String },

    #[error("aggregation operator '{value}' is not enabled")]
    OperatorNotEnabled { value: String },
}

impl Violation {
    /// Stable machine-readable constraint name
    pub fn constraint(&self) -> &'static str {
        match self {
            Violation::Empty => "empty",
            Violation::TooMany { .. } => "too_many",
            Violation::InvalidMember { .. } => "invalid_member",
            Violation::NonPositiveId { .. } => "non_positive_id",
            Violation::UnknownOperator { .. } => "unknown_operator",
            Violation::OperatorNotEnabled { .. } => "operator_not_enabled",
        }
    }
}

/// Field-specific validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {violation}")]
pub struct ValidationError {
    pub field: FilterField,
    pub violation: Violation,
}

impl ValidationError {
    pub fn new(field: FilterField, violation: Violation) -> Self {
        Self { field, violation }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Pipeline outcome
// ═══════════════════════════════════════════════════════════════════════════

/// Outcome kinds every transport binding must surface distinguishably
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Validation,
    NotFound,
    Store,
    NumericDomain,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Validation => "validation_error",
            OutcomeKind::NotFound => "not_found",
            OutcomeKind::Store => "store_error",
            OutcomeKind::NumericDomain => "numeric_domain",
        }
    }

    /// Process exit status used by the CLI binding (0 is success)
    pub fn exit_code(&self) -> i32 {
        match self {
            OutcomeKind::Validation => 2,
            OutcomeKind::NotFound => 3,
            OutcomeKind::Store => 4,
            OutcomeKind::NumericDomain => 5,
        }
    }

    /// Suggested status for an HTTP binding
    pub fn http_status(&self) -> u16 {
        match self {
            OutcomeKind::Validation => 400,
            OutcomeKind::NotFound => 404,
            OutcomeKind::Store => 500,
            OutcomeKind::NumericDomain => 422,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline error type
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No entry for parameters: {}", .filters.describe())]
    NotFound { filters: FilterSet },

    /// Display carries no store detail; the source keeps it for logs
    #[error("Database query error")]
    Store(#[from] StoreError),

    #[error("Weight {weight} for destination {destination_id} is outside the log domain")]
    NumericDomain { destination_id: CellId, weight: f64 },
}

impl ConnectivityError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ConnectivityError::Validation(_) => OutcomeKind::Validation,
            ConnectivityError::NotFound { .. } => OutcomeKind::NotFound,
            ConnectivityError::Store(_) => OutcomeKind::Store,
            ConnectivityError::NumericDomain { .. } => OutcomeKind::NumericDomain,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConnectivityError>;
