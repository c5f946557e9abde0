//! Aggregator: one weight per destination cell
//!
//! Edges arrive already filtered to the requested depths, time ranges and
//! origins. Every edge reaching a destination contributes to that
//! destination's group, whichever (depth, time range, origin) produced it.

use hexconn_storage::{CellId, Edge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reducer applied to each destination group
///
/// Closed set: request tokens outside it fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// `sum / count`
    #[default]
    Mean,
    Max,
    Min,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [Aggregation::Mean, Aggregation::Max, Aggregation::Min];

    /// Case-insensitive operator token
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "mean" => Some(Self::Mean),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Max => "max",
            Self::Min => "min",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated weight for one destination
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedEdge {
    pub destination_id: CellId,
    pub weight: f64,
}

/// Running state per destination
#[derive(Debug, Clone, Copy)]
struct Group {
    sum: f64,
    count: usize,
    max: f64,
    min: f64,
}

impl Group {
    fn new(weight: f64) -> Self {
        Self {
            sum: weight,
            count: 1,
            max: weight,
            min: weight,
        }
    }

    fn push(&mut self, weight: f64) {
        self.sum += weight;
        self.count += 1;
        // f64::max/min discard NaN; keep it so the normalizer can reject it
        if weight.is_nan() || self.max.is_nan() {
            self.max = f64::NAN;
            self.min = f64::NAN;
        } else {
            self.max = self.max.max(weight);
            self.min = self.min.min(weight);
        }
    }

    fn reduce(&self, op: Aggregation) -> f64 {
        match op {
            Aggregation::Mean => self.sum / self.count as f64,
            Aggregation::Max => self.max,
            Aggregation::Min => self.min,
        }
    }
}

/// Group `edges` by destination and reduce each group with `op`
///
/// Output holds exactly the destinations present in `edges`, ordered by id.
pub fn aggregate(edges: &[Edge], op: Aggregation) -> Vec<AggregatedEdge> {
    let mut groups: BTreeMap<CellId, Group> = BTreeMap::new();

    for edge in edges {
        groups
            .entry(edge.destination_id)
            .and_modify(|g| g.push(edge.weight))
            .or_insert_with(|| Group::new(edge.weight));
    }

    groups
        .into_iter()
        .map(|(destination_id, group)| AggregatedEdge {
            destination_id,
            weight: group.reduce(op),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexconn_storage::{Depth, TimeRange};

    fn cell(id: i64) -> CellId {
        CellId::new(id).unwrap()
    }

    fn edge(origin: i64, dest: i64, depth: Depth, time: TimeRange, weight: f64) -> Edge {
        Edge::new(cell(origin), cell(dest), depth, time, weight)
    }

    /// Destination 7 reached through three different filter combinations
    fn three_combinations() -> Vec<Edge> {
        vec![
            edge(1, 7, Depth::M05, TimeRange::D00To07, 4.0),
            edge(2, 7, Depth::M10, TimeRange::D07To14, 8.0),
            edge(1, 7, Depth::M15, TimeRange::D14To28, 12.0),
        ]
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mean
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_mean_across_combinations() {
        let result = aggregate(&three_combinations(), Aggregation::Mean);
        assert_eq!(
            result,
            vec![AggregatedEdge {
                destination_id: cell(7),
                weight: 8.0
            }]
        );
    }

    #[test]
    fn test_mean_independent_of_order() {
        let mut edges = three_combinations();
        edges.reverse();
        assert_eq!(aggregate(&edges, Aggregation::Mean)[0].weight, 8.0);

        edges.swap(0, 1);
        assert_eq!(aggregate(&edges, Aggregation::Mean)[0].weight, 8.0);
    }

    #[test]
    fn test_one_entry_per_destination() {
        let edges = vec![
            edge(42, 1, Depth::M05, TimeRange::D00To07, 10.0),
            edge(42, 2, Depth::M05, TimeRange::D00To07, 10.0),
            edge(42, 1, Depth::M05, TimeRange::D00To07, 30.0),
        ];
        let result = aggregate(&edges, Aggregation::Mean);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].destination_id, cell(1));
        assert_eq!(result[0].weight, 20.0);
        assert_eq!(result[1].destination_id, cell(2));
        assert_eq!(result[1].weight, 10.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], Aggregation::Mean).is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Max / Min
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_max_and_min() {
        let edges = three_combinations();
        assert_eq!(aggregate(&edges, Aggregation::Max)[0].weight, 12.0);
        assert_eq!(aggregate(&edges, Aggregation::Min)[0].weight, 4.0);
    }

    #[test]
    fn test_nan_survives_max_and_min() {
        for first in [f64::NAN, 3.0] {
            let second = if first.is_nan() { 3.0 } else { f64::NAN };
            let edges = vec![
                edge(42, 1, Depth::M05, TimeRange::D00To07, first),
                edge(42, 1, Depth::M10, TimeRange::D00To07, second),
                edge(42, 2, Depth::M05, TimeRange::D00To07, 1.0),
            ];

            for op in [Aggregation::Max, Aggregation::Min] {
                let result = aggregate(&edges, op);
                assert!(result[0].weight.is_nan(), "{:?} dropped NaN", op);
                assert_eq!(result[1].weight, 1.0);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Operator tokens
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_parse_operator() {
        assert_eq!(Aggregation::parse("mean"), Some(Aggregation::Mean));
        assert_eq!(Aggregation::parse("MEAN"), Some(Aggregation::Mean));
        assert_eq!(Aggregation::parse("Max"), Some(Aggregation::Max));
        assert_eq!(Aggregation::parse("median"), None);
        assert_eq!(Aggregation::parse(""), None);
        assert_eq!(Aggregation::default(), Aggregation::Mean);
    }
}
