use std::collections::BTreeSet;

use super::model::{PinKey, StatsRecord, ValueRecord};

/// Dataset id of the pooled rows in the statistics table.
pub const ALL_DATASETS: &str = "ALL";

// ---------------------------------------------------------------------------
// Pin predicates
// ---------------------------------------------------------------------------

/// Inclusive Pin window; an open side means "no bound".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PinRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PinRange {
    pub fn contains(&self, pin: f64) -> bool {
        self.min.map_or(true, |lo| pin >= lo) && self.max.map_or(true, |hi| pin <= hi)
    }
}

/// Approximate Pin equality: `|a - b| <= 1e-6 + 1e-5 * |b|`.
pub fn pin_matches(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 + 1e-5 * b.abs()
}

// ---------------------------------------------------------------------------
// Table selections
// ---------------------------------------------------------------------------

/// Sorted, de-duplicated dataset names present in a statistics table.
pub fn available_datasets(stats: &[StatsRecord]) -> BTreeSet<String> {
    stats.iter().map(|r| r.dataset.clone()).collect()
}

/// Sorted, de-duplicated Pins of one dataset.
pub fn dataset_pins(stats: &[StatsRecord], dataset: &str) -> Vec<f64> {
    stats
        .iter()
        .filter(|r| r.dataset == dataset)
        .map(|r| PinKey(r.pin))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|k| k.0)
        .collect()
}

/// Value rows that belong to an electron-density field and hold a finite,
/// strictly positive value.
pub fn positive_density_rows(values: Vec<ValueRecord>) -> Vec<ValueRecord> {
    values
        .into_iter()
        .filter(|r| r.field_name.to_ascii_lowercase().contains("electron_density"))
        .filter(|r| r.value.is_finite() && r.value > 0.0)
        .collect()
}

/// Normalise a dataset identifier typed by a user.
///
/// `all` (any case) maps to [`ALL_DATASETS`]; names already starting with
/// `r=` or `r2=` are kept; anything else is treated as a radius and gets an
/// `r=` prefix. Returns `None` for a blank name.
pub fn normalize_dataset_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.eq_ignore_ascii_case(ALL_DATASETS) {
        return Some(ALL_DATASETS.to_string());
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("r2=") || lower.starts_with("r=") {
        return Some(raw.to_string());
    }
    Some(format!("r={raw}"))
}
