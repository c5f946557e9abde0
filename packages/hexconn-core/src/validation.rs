//! Parameter Validator
//!
//! Turns raw delimited filter strings into a typed `ConnectivityRequest`.
//! Pure function of its input; no store access happens before it succeeds.

use hexconn_storage::{CellId, Depth, FilterSet, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::aggregation::Aggregation;
use crate::errors::{FilterField, ValidationError, Violation};

/// List delimiter for every multi-valued parameter
pub const DELIMITER: char = ',';

/// Raw request parameters as a transport receives them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFilterParams {
    pub depth: Option<String>,
    pub time_range: Option<String>,
    #[serde(alias = "start_id")]
    pub origin_ids: Option<String>,
    pub aggregate: Option<String>,
}

impl RawFilterParams {
    pub fn new(
        depth: impl Into<String>,
        time_range: impl Into<String>,
        origin_ids: impl Into<String>,
    ) -> Self {
        Self {
            depth: Some(depth.into()),
            time_range: Some(time_range.into()),
            origin_ids: Some(origin_ids.into()),
            aggregate: None,
        }
    }

    pub fn with_aggregate(mut self, aggregate: impl Into<String>) -> Self {
        self.aggregate = Some(aggregate.into());
        self
    }
}

/// Maximum list cardinalities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FilterLimits {
    pub max_depths: usize,
    pub max_time_ranges: usize,
    pub max_origin_ids: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_depths: 10,
            max_time_ranges: 10,
            max_origin_ids: 100,
        }
    }
}

/// Validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityRequest {
    pub filters: FilterSet,
    pub aggregation: Aggregation,
}

/// Filter validator
#[derive(Debug, Clone)]
pub struct FilterValidator {
    limits: FilterLimits,
    enabled: BTreeSet<Aggregation>,
    default_op: Aggregation,
}

impl Default for FilterValidator {
    fn default() -> Self {
        Self::new(FilterLimits::default(), [Aggregation::Mean], Aggregation::Mean)
    }
}

impl FilterValidator {
    pub fn new(
        limits: FilterLimits,
        enabled: impl IntoIterator<Item = Aggregation>,
        default_op: Aggregation,
    ) -> Self {
        Self {
            limits,
            enabled: enabled.into_iter().collect(),
            default_op,
        }
    }

    pub fn limits(&self) -> &FilterLimits {
        &self.limits
    }

    pub fn default_operator(&self) -> Aggregation {
        self.default_op
    }

    pub fn enabled_operators(&self) -> impl Iterator<Item = Aggregation> + '_ {
        self.enabled.iter().copied()
    }

    /// Validate all fields in order: depth, time_range, origin_ids, aggregate
    ///
    /// The first failing field is reported.
    pub fn validate(&self, raw: &RawFilterParams) -> Result<ConnectivityRequest, ValidationError> {
        let depths = parse_list(
            FilterField::Depth,
            raw.depth.as_deref(),
            self.limits.max_depths,
            |token| Depth::parse(token).ok_or_else(|| invalid_member(token)),
        )?;

        let time_ranges = parse_list(
            FilterField::TimeRange,
            raw.time_range.as_deref(),
            self.limits.max_time_ranges,
            |token| TimeRange::parse(token).ok_or_else(|| invalid_member(token)),
        )?;

        let origin_ids = parse_list(
            FilterField::OriginIds,
            raw.origin_ids.as_deref(),
            self.limits.max_origin_ids,
            parse_origin_id,
        )?;

        let aggregation = self.parse_operator(raw.aggregate.as_deref())?;

        Ok(ConnectivityRequest {
            filters: FilterSet {
                depths,
                time_ranges,
                origin_ids,
            },
            aggregation,
        })
    }

    fn parse_operator(&self, raw: Option<&str>) -> Result<Aggregation, ValidationError> {
        let token = raw.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Ok(self.default_op);
        }

        let op = Aggregation::parse(token).ok_or_else(|| {
            ValidationError::new(
                FilterField::Aggregate,
                Violation::UnknownOperator {
                    value: token.to_string(),
                },
            )
        })?;

        if !self.enabled.contains(&op) {
            return Err(ValidationError::new(
                FilterField::Aggregate,
                Violation::OperatorNotEnabled {
                    value: op.as_str().to_string(),
                },
            ));
        }

        Ok(op)
    }
}

/// Split on the delimiter, trim, drop empty tokens
fn tokens(raw: Option<&str>) -> Vec<&str> {
    raw.unwrap_or_default()
        .split(DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Cardinality is checked on the token count, before de-duplication
fn parse_list<T: Ord>(
    field: FilterField,
    raw: Option<&str>,
    limit: usize,
    parse: impl Fn(&str) -> Result<T, Violation>,
) -> Result<BTreeSet<T>, ValidationError> {
    let tokens = tokens(raw);

    if tokens.is_empty() {
        return Err(ValidationError::new(field, Violation::Empty));
    }
    if tokens.len() > limit {
        return Err(ValidationError::new(
            field,
            Violation::TooMany {
                limit,
                found: tokens.len(),
            },
        ));
    }

    tokens
        .into_iter()
        .map(|token| parse(token).map_err(|violation| ValidationError::new(field, violation)))
        .collect()
}

fn invalid_member(token: &str) -> Violation {
    Violation::InvalidMember {
        value: token.to_string(),
    }
}

fn parse_origin_id(token: &str) -> Result<CellId, Violation> {
    let value: i64 = token.parse().map_err(|_| invalid_member(token))?;
    CellId::new(value).ok_or_else(|| Violation::NonPositiveId {
        value: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> FilterValidator {
        FilterValidator::default()
    }

    fn field_error(raw: &RawFilterParams) -> ValidationError {
        validator().validate(raw).unwrap_err()
    }

    fn repeat(token: &str, n: usize) -> String {
        vec![token; n].join(",")
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accepted input
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_every_depth_band_accepted() {
        for depth in Depth::ALL {
            let raw = RawFilterParams::new(depth.as_str(), "00d-07d", "1");
            let request = validator().validate(&raw).unwrap();
            assert_eq!(request.filters.depths, BTreeSet::from([depth]));
        }
    }

    #[test]
    fn test_every_time_band_accepted() {
        for time in TimeRange::ALL {
            let raw = RawFilterParams::new("05m", time.as_str(), "1");
            let request = validator().validate(&raw).unwrap();
            assert_eq!(request.filters.time_ranges, BTreeSet::from([time]));
        }
    }

    #[test]
    fn test_multi_valued_lists() {
        let raw = RawFilterParams::new("05m,15m", " 00d-07d , 14d-28d ", "42,7,,42");
        let request = validator().validate(&raw).unwrap();

        assert_eq!(request.filters.depths.len(), 2);
        assert_eq!(request.filters.time_ranges.len(), 2);
        // Duplicates collapse; empty token dropped
        let ids: Vec<i64> = request.filters.origin_ids.iter().map(|c| c.get()).collect();
        assert_eq!(ids, vec![7, 42]);
        assert_eq!(request.aggregation, Aggregation::Mean);
    }

    #[test]
    fn test_lists_at_limit_accepted() {
        let ids: Vec<String> = (1..=100).map(|i| i.to_string()).collect();
        let raw = RawFilterParams::new(repeat("05m", 10), repeat("00d-07d", 10), ids.join(","));
        assert!(validator().validate(&raw).is_ok());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rejected input
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_unknown_depth_rejected() {
        for bad in ["25m", "5m", "05M", "0.5m", "05m;"] {
            let err = field_error(&RawFilterParams::new(bad, "00d-07d", "1"));
            assert_eq!(err.field, FilterField::Depth);
            assert_eq!(
                err.violation,
                Violation::InvalidMember {
                    value: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn test_unknown_time_range_rejected() {
        for bad in ["28d-56d", "00d-7d", "00d_07d"] {
            let err = field_error(&RawFilterParams::new("05m", bad, "1"));
            assert_eq!(err.field, FilterField::TimeRange);
            assert_eq!(err.violation.constraint(), "invalid_member");
        }
    }

    #[test]
    fn test_one_over_limit_rejected() {
        let err = field_error(&RawFilterParams::new(repeat("05m", 11), "00d-07d", "1"));
        assert_eq!(err.field, FilterField::Depth);
        assert_eq!(
            err.violation,
            Violation::TooMany {
                limit: 10,
                found: 11
            }
        );

        let err = field_error(&RawFilterParams::new("05m", repeat("07d-14d", 11), "1"));
        assert_eq!(err.field, FilterField::TimeRange);
        assert_eq!(err.violation.constraint(), "too_many");

        let ids: Vec<String> = (1..=101).map(|i| i.to_string()).collect();
        let err = field_error(&RawFilterParams::new("05m", "00d-07d", ids.join(",")));
        assert_eq!(err.field, FilterField::OriginIds);
        assert_eq!(
            err.violation,
            Violation::TooMany {
                limit: 100,
                found: 101
            }
        );
    }

    #[test]
    fn test_empty_lists_rejected() {
        let err = field_error(&RawFilterParams::new("", "00d-07d", "1"));
        assert_eq!((err.field, err.violation), (FilterField::Depth, Violation::Empty));

        let err = field_error(&RawFilterParams::new("05m", " , ,", "1"));
        assert_eq!((err.field, err.violation), (FilterField::TimeRange, Violation::Empty));

        let raw = RawFilterParams {
            depth: Some("05m".to_string()),
            time_range: Some("00d-07d".to_string()),
            ..Default::default()
        };
        let err = field_error(&raw);
        assert_eq!((err.field, err.violation), (FilterField::OriginIds, Violation::Empty));
    }

    #[test]
    fn test_origin_ids_must_be_positive_integers() {
        for bad in ["0", "-3", "-0"] {
            let err = field_error(&RawFilterParams::new("05m", "00d-07d", bad));
            assert_eq!(err.field, FilterField::OriginIds);
            assert_eq!(err.violation.constraint(), "non_positive_id");
        }
        for bad in ["abc", "4.2", "1e3", "99999999999999999999"] {
            let err = field_error(&RawFilterParams::new("05m", "00d-07d", bad));
            assert_eq!(err.violation.constraint(), "invalid_member");
        }
    }

    #[test]
    fn test_first_failing_field_reported() {
        let err = field_error(&RawFilterParams::new("99m", "bad", "0"));
        assert_eq!(err.field, FilterField::Depth);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Aggregation operator
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_operator_defaults_to_mean() {
        let raw = RawFilterParams::new("05m", "00d-07d", "1").with_aggregate("  ");
        assert_eq!(validator().validate(&raw).unwrap().aggregation, Aggregation::Mean);

        let raw = RawFilterParams::new("05m", "00d-07d", "1").with_aggregate("Mean");
        assert_eq!(validator().validate(&raw).unwrap().aggregation, Aggregation::Mean);
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let raw = RawFilterParams::new("05m", "00d-07d", "1").with_aggregate("median");
        let err = field_error(&raw);
        assert_eq!(err.field, FilterField::Aggregate);
        assert_eq!(err.violation.constraint(), "unknown_operator");
    }

    #[test]
    fn test_reserved_operator_needs_enabling() {
        let raw = RawFilterParams::new("05m", "00d-07d", "1").with_aggregate("max");
        let err = field_error(&raw);
        assert_eq!(
            err.violation,
            Violation::OperatorNotEnabled {
                value: "max".to_string()
            }
        );

        let permissive = FilterValidator::new(
            FilterLimits::default(),
            Aggregation::ALL,
            Aggregation::Mean,
        );
        assert_eq!(permissive.validate(&raw).unwrap().aggregation, Aggregation::Max);
    }

    #[test]
    fn test_custom_limits() {
        let strict = FilterValidator::new(
            FilterLimits {
                max_depths: 1,
                max_time_ranges: 1,
                max_origin_ids: 2,
            },
            [Aggregation::Mean],
            Aggregation::Mean,
        );
        assert!(strict.validate(&RawFilterParams::new("05m", "00d-07d", "1,2")).is_ok());
        assert!(strict.validate(&RawFilterParams::new("05m", "00d-07d", "1,2,3")).is_err());
        assert!(strict.validate(&RawFilterParams::new("05m,10m", "00d-07d", "1")).is_err());
    }

    #[test]
    fn test_legacy_start_id_alias() {
        let raw: RawFilterParams =
            serde_json::from_str(r#"{"depth": "05m", "time_range": "00d-07d", "start_id": "42"}"#)
                .unwrap();
        let request = validator().validate(&raw).unwrap();
        assert_eq!(request.filters.origin_ids, BTreeSet::from([CellId::new(42).unwrap()]));
    }
}
