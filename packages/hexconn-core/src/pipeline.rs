//! Connectivity pipeline
//!
//! validate → fetch → aggregate → normalize → assemble, one request at a
//! time. The store is handed in per call; the pipeline holds no handle and no
//! mutable state, so a single instance can serve concurrent requests.

use std::time::Duration;

use hexconn_storage::{EdgeStore, StoreError};
use tracing::{debug, info, warn};

use crate::aggregation::{aggregate, Aggregation};
use crate::errors::{ConnectivityError, Result};
use crate::normalization::LogNormalizer;
use crate::response::{assemble, ConnectivityPayload};
use crate::validation::{ConnectivityRequest, FilterValidator, RawFilterParams};

/// Default bound on a single store fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings for `ConnectivityPipeline`
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub validator: FilterValidator,
    pub normalizer: LogNormalizer,
    pub fetch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validator: FilterValidator::default(),
            normalizer: LogNormalizer::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Request pipeline
#[derive(Debug, Clone, Default)]
pub struct ConnectivityPipeline {
    config: PipelineConfig,
}

impl ConnectivityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate raw parameters, then run the request
    ///
    /// Validation failures return before the store is touched.
    pub async fn run(
        &self,
        store: &dyn EdgeStore,
        raw: &RawFilterParams,
    ) -> Result<ConnectivityPayload> {
        let request = self.config.validator.validate(raw)?;
        self.run_request(store, &request).await
    }

    /// Run an already validated request
    pub async fn run_request(
        &self,
        store: &dyn EdgeStore,
        request: &ConnectivityRequest,
    ) -> Result<ConnectivityPayload> {
        let filters = &request.filters;
        info!(
            backend = store.backend_name(),
            depths = filters.depths.len(),
            time_ranges = filters.time_ranges.len(),
            origins = filters.origin_ids.len(),
            aggregation = %request.aggregation,
            "connectivity request"
        );

        let edges = match tokio::time::timeout(self.config.fetch_timeout, store.fetch_edges(filters))
            .await
        {
            Ok(Ok(edges)) => edges,
            Ok(Err(e)) => {
                warn!(backend = store.backend_name(), error = %e, "edge fetch failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    backend = store.backend_name(),
                    timeout_ms = self.config.fetch_timeout.as_millis() as u64,
                    "edge fetch timed out"
                );
                return Err(StoreError::timeout(format!(
                    "Edge fetch exceeded {:?}",
                    self.config.fetch_timeout
                ))
                .into());
            }
        };
        debug!(edges = edges.len(), "fetched edges");

        let not_found = || ConnectivityError::NotFound {
            filters: filters.clone(),
        };
        if edges.is_empty() {
            return Err(not_found());
        }

        let edges = self.config.normalizer.screen_edges(edges)?;
        if edges.is_empty() {
            debug!("every matched edge was non-positive");
            return Err(not_found());
        }

        let aggregated = aggregate(&edges, request.aggregation);
        debug!(destinations = aggregated.len(), "aggregated destinations");

        let normalized = self.config.normalizer.normalize(&aggregated)?;
        Ok(assemble(&normalized, store.id_kind()))
    }

    /// Operator applied when a request names none
    pub fn default_aggregation(&self) -> Aggregation {
        self.config.validator.default_operator()
    }
}
