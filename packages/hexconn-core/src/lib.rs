/*
 * hexconn-core - Larval Connectivity Pipeline
 *
 * Request flow:
 * - validation/    : raw delimited filters → typed ConnectivityRequest
 * - store          : edge store chosen from configuration
 * - aggregation/   : one weight per destination (mean by default)
 * - normalization/ : log-ratio min-max rescaling onto [0, 1]
 * - response/      : success payload and error bodies
 * - pipeline/      : the stages above, in order, per request
 */

pub mod aggregation;
pub mod config;
pub mod errors;
pub mod normalization;
pub mod pipeline;
pub mod response;
pub mod store;
pub mod validation;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use aggregation::{aggregate, AggregatedEdge, Aggregation};
pub use config::{ConfigError, ServiceConfig, StoreBackend, StoreConfig, Validatable};
pub use errors::{
    ConnectivityError, FilterField, OutcomeKind, Result, ValidationError, Violation,
};
pub use normalization::{LogNormalizer, NonPositivePolicy, NormalizedEdge};
pub use pipeline::{ConnectivityPipeline, PipelineConfig};
pub use response::{assemble, ConnectivityPayload, DestinationWeight, ErrorBody, RenderedId};
pub use store::open_store;
pub use validation::{ConnectivityRequest, FilterLimits, FilterValidator, RawFilterParams};

pub use hexconn_storage as storage;
