//! Domain models for larval connectivity
//!
//! - `Depth` / `TimeRange`: closed enumerations of the simulated bands
//! - `CellId`: strictly positive hexagon cell identifier
//! - `IdKind`: how a store's schema represents cell identifiers
//! - `Edge`: directed, weighted dispersal edge
//! - `FilterSet`: set-membership filter over (origin, depth, time range)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════════
// Bands
// ═══════════════════════════════════════════════════════════════════════════

/// Release depth band of a dispersal simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Depth {
    #[serde(rename = "05m")]
    M05,
    #[serde(rename = "10m")]
    M10,
    #[serde(rename = "15m")]
    M15,
}

impl Depth {
    pub const ALL: [Depth; 3] = [Depth::M05, Depth::M10, Depth::M15];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M05 => "05m",
            Self::M10 => "10m",
            Self::M15 => "15m",
        }
    }

    /// Parse a band label, exact match only
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown depth band '{}'. Valid bands: {}",
                s,
                join_labels(Self::ALL.iter().map(|d| d.as_str()))
            )
        })
    }
}

/// Settlement time window of a dispersal simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "00d-07d")]
    D00To07,
    #[serde(rename = "07d-14d")]
    D07To14,
    #[serde(rename = "14d-28d")]
    D14To28,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::D00To07, TimeRange::D07To14, TimeRange::D14To28];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::D00To07 => "00d-07d",
            Self::D07To14 => "07d-14d",
            Self::D14To28 => "14d-28d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown time range '{}'. Valid ranges: {}",
                s,
                join_labels(Self::ALL.iter().map(|t| t.as_str()))
            )
        })
    }
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

// ═══════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════

/// Hexagon cell identifier (always > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct CellId(i64);

impl CellId {
    /// Returns `None` for zero or negative values
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for CellId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("Cell id must be positive, got {}", value))
    }
}

impl From<CellId> for i64 {
    fn from(id: CellId) -> Self {
        id.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier representation declared by a store's schema
///
/// Decided once when the store is opened and carried unchanged into every
/// response built from that store. Never inferred from returned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    /// Integer columns; ids render as JSON numbers
    #[default]
    Numeric,
    /// Text columns; ids render as JSON strings
    Text,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Edges
// ═══════════════════════════════════════════════════════════════════════════

/// Directed dispersal edge between two cells
///
/// Immutable once fetched. `weight` is a non-negative concentration; stores do
/// not police its sign, the normalizer does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub origin_id: CellId,
    pub destination_id: CellId,
    pub depth: Depth,
    pub time_range: TimeRange,
    pub weight: f64,
}

impl Edge {
    pub fn new(
        origin_id: CellId,
        destination_id: CellId,
        depth: Depth,
        time_range: TimeRange,
        weight: f64,
    ) -> Self {
        Self {
            origin_id,
            destination_id,
            depth,
            time_range,
            weight,
        }
    }
}

/// Raw loader record, column names as in the exported connectivity tables
///
/// `time` is accepted as an alias of `time_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub start_id: i64,
    pub end_id: i64,
    #[serde(alias = "time")]
    pub time_range: String,
    pub depth: String,
    pub weight: f64,
}

impl TryFrom<EdgeRecord> for Edge {
    type Error = String;

    fn try_from(record: EdgeRecord) -> Result<Self, Self::Error> {
        Ok(Edge {
            origin_id: CellId::try_from(record.start_id)?,
            destination_id: CellId::try_from(record.end_id)?,
            depth: record.depth.parse()?,
            time_range: record.time_range.parse()?,
            weight: record.weight,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Filter
// ═══════════════════════════════════════════════════════════════════════════

/// Set-membership filter handed to `EdgeStore::fetch_edges`
///
/// Each dimension is matched independently, so the filter covers the full
/// cross-product of the three sets. Sets are ordered so queries and
/// messages are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSet {
    pub depths: BTreeSet<Depth>,
    pub time_ranges: BTreeSet<TimeRange>,
    pub origin_ids: BTreeSet<CellId>,
}

impl FilterSet {
    pub fn new(
        depths: impl IntoIterator<Item = Depth>,
        time_ranges: impl IntoIterator<Item = TimeRange>,
        origin_ids: impl IntoIterator<Item = CellId>,
    ) -> Self {
        Self {
            depths: depths.into_iter().collect(),
            time_ranges: time_ranges.into_iter().collect(),
            origin_ids: origin_ids.into_iter().collect(),
        }
    }

    /// True when any dimension is empty (matches nothing)
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty() || self.time_ranges.is_empty() || self.origin_ids.is_empty()
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.origin_ids.contains(&edge.origin_id)
            && self.depths.contains(&edge.depth)
            && self.time_ranges.contains(&edge.time_range)
    }

    /// Query-string style rendering, e.g. `depth=05m,10m&time_range=00d-07d&origin_ids=42`
    pub fn describe(&self) -> String {
        let depths: Vec<_> = self.depths.iter().map(|d| d.as_str()).collect();
        let times: Vec<_> = self.time_ranges.iter().map(|t| t.as_str()).collect();
        let origins: Vec<_> = self.origin_ids.iter().map(|o| o.to_string()).collect();
        format!(
            "depth={}&time_range={}&origin_ids={}",
            depths.join(","),
            times.join(","),
            origins.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: i64) -> CellId {
        CellId::new(id).unwrap()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Band Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_depth_labels_roundtrip() {
        for depth in Depth::ALL {
            assert_eq!(Depth::parse(depth.as_str()), Some(depth));
            assert_eq!(depth.as_str().parse::<Depth>().unwrap(), depth);
        }
    }

    #[test]
    fn test_depth_rejects_unknown() {
        assert_eq!(Depth::parse("5m"), None);
        assert_eq!(Depth::parse("05M"), None);
        assert_eq!(Depth::parse("25m"), None);

        let err = "99m".parse::<Depth>().unwrap_err();
        assert!(err.contains("99m"));
        assert!(err.contains("05m, 10m, 15m"));
    }

    #[test]
    fn test_time_range_labels() {
        assert_eq!(TimeRange::parse("00d-07d"), Some(TimeRange::D00To07));
        assert_eq!(TimeRange::parse("07d-14d"), Some(TimeRange::D07To14));
        assert_eq!(TimeRange::parse("14d-28d"), Some(TimeRange::D14To28));
        assert_eq!(TimeRange::parse("28d-56d"), None);
    }

    #[test]
    fn test_band_serde_uses_labels() {
        let json = serde_json::to_string(&Depth::M10).unwrap();
        assert_eq!(json, "\"10m\"");

        let parsed: TimeRange = serde_json::from_str("\"07d-14d\"").unwrap();
        assert_eq!(parsed, TimeRange::D07To14);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // CellId Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_cell_id_positive_only() {
        assert_eq!(CellId::new(42).map(|c| c.get()), Some(42));
        assert!(CellId::new(0).is_none());
        assert!(CellId::new(-7).is_none());
    }

    #[test]
    fn test_cell_id_serde_rejects_zero() {
        let parsed: CellId = serde_json::from_str("17").unwrap();
        assert_eq!(parsed.get(), 17);
        assert!(serde_json::from_str::<CellId>("0").is_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // EdgeRecord Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_edge_record_accepts_time_alias() {
        let record: EdgeRecord = serde_json::from_str(
            r#"{"start_id": 42, "end_id": 7, "time": "00d-07d", "depth": "05m", "weight": 0.25}"#,
        )
        .unwrap();

        let edge = Edge::try_from(record).unwrap();
        assert_eq!(edge.origin_id, cell(42));
        assert_eq!(edge.destination_id, cell(7));
        assert_eq!(edge.depth, Depth::M05);
        assert_eq!(edge.time_range, TimeRange::D00To07);
        assert_eq!(edge.weight, 0.25);
    }

    #[test]
    fn test_edge_record_invalid_band() {
        let record = EdgeRecord {
            start_id: 1,
            end_id: 2,
            time_range: "00d-07d".to_string(),
            depth: "40m".to_string(),
            weight: 1.0,
        };
        assert!(Edge::try_from(record).unwrap_err().contains("40m"));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // FilterSet Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_filter_matches_cross_product() {
        let filters = FilterSet::new(
            [Depth::M05, Depth::M15],
            [TimeRange::D00To07],
            [cell(1), cell(2)],
        );

        let hit = Edge::new(cell(2), cell(9), Depth::M15, TimeRange::D00To07, 1.0);
        let wrong_depth = Edge::new(cell(2), cell(9), Depth::M10, TimeRange::D00To07, 1.0);
        let wrong_origin = Edge::new(cell(3), cell(9), Depth::M05, TimeRange::D00To07, 1.0);
        let wrong_time = Edge::new(cell(1), cell(9), Depth::M05, TimeRange::D14To28, 1.0);

        assert!(filters.matches(&hit));
        assert!(!filters.matches(&wrong_depth));
        assert!(!filters.matches(&wrong_origin));
        assert!(!filters.matches(&wrong_time));
    }

    #[test]
    fn test_filter_describe_is_sorted() {
        let filters = FilterSet::new(
            [Depth::M15, Depth::M05],
            [TimeRange::D00To07],
            [cell(43), cell(42)],
        );
        assert_eq!(
            filters.describe(),
            "depth=05m,15m&time_range=00d-07d&origin_ids=42,43"
        );
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(FilterSet::default().is_empty());
        assert!(FilterSet::new([Depth::M05], [], [cell(1)]).is_empty());
        assert!(!FilterSet::new([Depth::M05], [TimeRange::D07To14], [cell(1)]).is_empty());
    }
}
