use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PinKey – an orderable Pin value used as a grouping key
// ---------------------------------------------------------------------------

/// A Pin value (W) that can be used as a `BTreeMap` key.
/// Ordering follows `f64::total_cmp`, so grouping is by exact value.
#[derive(Debug, Clone, Copy)]
pub struct PinKey(pub f64);

impl PartialEq for PinKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PinKey {}

impl PartialOrd for PinKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PinKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Point arrays – raw mesh point data
// ---------------------------------------------------------------------------

/// One named point-data array as read from a mesh.
/// `values` holds `components` interleaved entries per point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointArray {
    pub name: String,
    pub components: usize,
    pub values: Vec<f64>,
}

impl PointArray {
    /// Convenience constructor for a one-component array.
    pub fn scalar(name: impl Into<String>, values: Vec<f64>) -> Self {
        PointArray {
            name: name.into(),
            components: 1,
            values,
        }
    }
}

/// A scalar density field selected from a mesh, already reduced to 1-D.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    pub name: String,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// One finite point sample of one density field, tagged with its dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValueRow {
    pub dataset: String,
    pub pin: f64,
    pub field_name: String,
    pub time_step: usize,
    pub point_index: usize,
    pub value: f64,
}

/// Summary statistics for one (dataset, pin) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinStatsRow {
    pub dataset: String,
    pub pin: f64,
    pub mode: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub valid_points: usize,
    pub dataset_count: usize,
}

/// Per-field statistics of a single case (one row per density field).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStatsRow {
    pub pin: f64,
    pub field_name: String,
    pub time_step: usize,
    pub total_points: usize,
    pub valid_points: usize,
    pub missing_points: usize,
    pub mean: f64,
    pub mode: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// A per-point row of a single case with its field statistics merged in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseValueRow {
    pub pin: f64,
    pub field_name: String,
    pub time_step: usize,
    pub point_index: usize,
    pub value: f64,
    pub total_points: usize,
    pub valid_points: usize,
    pub missing_points: usize,
    pub mean: f64,
    pub mode: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl CaseValueRow {
    pub fn merge(row: &PointValueRow, stats: &FieldStatsRow) -> Self {
        CaseValueRow {
            pin: row.pin,
            field_name: row.field_name.clone(),
            time_step: row.time_step,
            point_index: row.point_index,
            value: row.value,
            total_points: stats.total_points,
            valid_points: stats.valid_points,
            missing_points: stats.missing_points,
            mean: stats.mean,
            mode: stats.mode,
            std: stats.std,
            min: stats.min,
            q1: stats.q1,
            median: stats.median,
            q3: stats.q3,
            max: stats.max,
        }
    }
}

// ---------------------------------------------------------------------------
// Records read back from the aggregated tables
// ---------------------------------------------------------------------------

/// Subset of the statistics table used by the consumers.
/// Optional columns default to NaN when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsRecord {
    pub dataset: String,
    pub pin: f64,
    #[serde(default = "nan")]
    pub mode: f64,
    #[serde(default = "nan")]
    pub min: f64,
    #[serde(default = "nan")]
    pub max: f64,
}

/// Subset of the point-value table used by the distribution curves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueRecord {
    pub dataset: String,
    pub pin: f64,
    pub field_name: String,
    pub value: f64,
}

fn nan() -> f64 {
    f64::NAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn pin_keys_sort_numerically() {
        let keys: BTreeSet<PinKey> = [800.0, 100.0, 200.0, 100.0]
            .into_iter()
            .map(PinKey)
            .collect();
        let sorted: Vec<f64> = keys.into_iter().map(|k| k.0).collect();
        assert_eq!(sorted, vec![100.0, 200.0, 800.0]);
    }
}
