//! Normalizer: log-ratio min-max rescaling onto `[0, 1]`
//!
//! ```text
//! normalized = (ln(w) - ln(min)) / (ln(max) - ln(min))
//! ```
//!
//! `min` and `max` are taken over the whole batch, so every destination of
//! one request lands on a common scale. A batch with `max == min` (including
//! a single destination) maps every weight to exactly `1.0`.
//!
//! The log transform needs strictly positive input. `NonPositivePolicy`
//! decides what happens to weights `<= 0`; non-finite weights are always
//! rejected.

use hexconn_storage::{CellId, Edge};
use serde::{Deserialize, Serialize};

use crate::aggregation::AggregatedEdge;
use crate::errors::{ConnectivityError, Result};

/// Default floor for `NonPositivePolicy::Clamp`
pub const DEFAULT_CLAMP_EPSILON: f64 = 1e-12;

/// Handling of zero and negative weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonPositivePolicy {
    /// Fail the whole batch with `NumericDomain`
    #[default]
    Reject,
    /// Raise the weight to the configured epsilon
    Clamp,
    /// Drop offending edges before aggregation
    Exclude,
}

impl NonPositivePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Clamp => "clamp",
            Self::Exclude => "exclude",
        }
    }
}

/// Normalized weight for one destination
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedEdge {
    pub destination_id: CellId,
    pub weight: f64,
}

/// Log-ratio normalizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogNormalizer {
    policy: NonPositivePolicy,
    clamp_epsilon: f64,
}

impl Default for LogNormalizer {
    fn default() -> Self {
        Self::new(NonPositivePolicy::Reject, DEFAULT_CLAMP_EPSILON)
    }
}

impl LogNormalizer {
    /// `clamp_epsilon` must be finite and > 0 (checked by config validation)
    pub fn new(policy: NonPositivePolicy, clamp_epsilon: f64) -> Self {
        Self {
            policy,
            clamp_epsilon,
        }
    }

    pub fn policy(&self) -> NonPositivePolicy {
        self.policy
    }

    /// Edge-level guard, applied before aggregation
    ///
    /// Non-finite weights are always rejected. Negative weights are rejected,
    /// raised to the clamp epsilon or dropped, per policy. `Exclude` also
    /// drops zero weights; other policies leave zeros to the batch guard.
    pub fn screen_edges(&self, edges: Vec<Edge>) -> Result<Vec<Edge>> {
        let mut screened = Vec::with_capacity(edges.len());

        for mut edge in edges {
            if !edge.weight.is_finite() {
                return Err(domain_violation(edge.destination_id, edge.weight));
            }
            let keep_zero = self.policy != NonPositivePolicy::Exclude;
            if edge.weight > 0.0 || (edge.weight == 0.0 && keep_zero) {
                screened.push(edge);
                continue;
            }

            match self.policy {
                NonPositivePolicy::Reject => {
                    return Err(domain_violation(edge.destination_id, edge.weight))
                }
                NonPositivePolicy::Clamp => {
                    edge.weight = self.clamp_epsilon;
                    screened.push(edge);
                }
                NonPositivePolicy::Exclude => {
                    tracing::debug!(destination = %edge.destination_id, weight = edge.weight, "excluding non-positive edge");
                }
            }
        }

        Ok(screened)
    }

    /// Rescale a whole batch
    ///
    /// The positivity guard runs before the degenerate check, so `[0, 0]`
    /// under `Reject` is an error rather than `[1, 1]`.
    pub fn normalize(&self, batch: &[AggregatedEdge]) -> Result<Vec<NormalizedEdge>> {
        let guarded = self.guard(batch)?;

        let Some((min, max)) = min_max(&guarded) else {
            return Ok(Vec::new());
        };

        let ln_min = min.ln();
        let span = max.ln() - ln_min;

        // Also covers distinct weights whose logs round to the same value
        if max == min || span <= 0.0 {
            return Ok(guarded
                .iter()
                .map(|e| NormalizedEdge {
                    destination_id: e.destination_id,
                    weight: 1.0,
                })
                .collect());
        }

        Ok(guarded
            .iter()
            .map(|e| NormalizedEdge {
                destination_id: e.destination_id,
                weight: ((e.weight.ln() - ln_min) / span).clamp(0.0, 1.0),
            })
            .collect())
    }

    /// Apply the policy; every returned weight is finite and > 0
    ///
    /// Clamped weights never rise above the smallest positive weight in the
    /// batch, so a clamped zero cannot outrank a real observation.
    fn guard(&self, batch: &[AggregatedEdge]) -> Result<Vec<AggregatedEdge>> {
        let floor = batch
            .iter()
            .map(|e| e.weight)
            .filter(|w| w.is_finite() && *w > 0.0)
            .fold(self.clamp_epsilon, f64::min);

        let mut guarded = Vec::with_capacity(batch.len());

        for edge in batch {
            if !edge.weight.is_finite() {
                return Err(domain_violation(edge.destination_id, edge.weight));
            }
            if edge.weight > 0.0 {
                guarded.push(*edge);
                continue;
            }

            match self.policy {
                NonPositivePolicy::Reject => {
                    return Err(domain_violation(edge.destination_id, edge.weight))
                }
                NonPositivePolicy::Clamp => guarded.push(AggregatedEdge {
                    destination_id: edge.destination_id,
                    weight: floor,
                }),
                NonPositivePolicy::Exclude => {
                    tracing::debug!(destination = %edge.destination_id, weight = edge.weight, "excluding non-positive weight");
                }
            }
        }

        Ok(guarded)
    }
}

fn domain_violation(destination_id: CellId, weight: f64) -> ConnectivityError {
    tracing::warn!(destination = %destination_id, weight, "weight outside log domain");
    ConnectivityError::NumericDomain {
        destination_id,
        weight,
    }
}

fn min_max(batch: &[AggregatedEdge]) -> Option<(f64, f64)> {
    let first = batch.first()?.weight;
    Some(batch.iter().fold((first, first), |(lo, hi), e| {
        (lo.min(e.weight), hi.max(e.weight))
    }))
}
