use std::fmt;
use std::path::Path;

use crate::data::filter::{available_datasets, dataset_pins};
use crate::data::loader::read_table;
use crate::data::model::StatsRecord;
use crate::error::{PipelineError, Result};

/// Two consecutive covered Pins further apart than the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinGap {
    pub from: f64,
    pub to: f64,
    pub diff: f64,
}

impl fmt::Display for PinGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}  (diff {} W)", self.from, self.to, self.diff)
    }
}

/// Pin coverage of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub dataset: String,
    /// Sorted, unique Pins.
    pub pins: Vec<f64>,
    pub gaps: Vec<PinGap>,
}

/// Gaps between consecutive entries of an ascending Pin list.
pub fn find_gaps(sorted_pins: &[f64], max_gap: f64) -> Vec<PinGap> {
    sorted_pins
        .windows(2)
        .filter_map(|pair| {
            let diff = pair[1] - pair[0];
            (diff > max_gap).then_some(PinGap {
                from: pair[0],
                to: pair[1],
                diff,
            })
        })
        .collect()
}

/// Coverage of `dataset` within already-loaded statistics rows.
pub fn coverage(stats: &[StatsRecord], dataset: &str, max_gap: f64) -> Result<Coverage> {
    let available = available_datasets(stats);
    if !available.contains(dataset) {
        return Err(PipelineError::EmptyData(format!(
            "Dataset '{dataset}' not found. Available datasets: {}",
            available.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    let pins = dataset_pins(stats, dataset);
    let gaps = find_gaps(&pins, max_gap);
    Ok(Coverage {
        dataset: dataset.to_string(),
        pins,
        gaps,
    })
}

/// Load a statistics table and report the coverage of `dataset`.
pub fn coverage_from_file(stats_path: &Path, dataset: &str, max_gap: f64) -> Result<Coverage> {
    let stats: Vec<StatsRecord> = read_table(stats_path, &["dataset", "pin"])?;
    coverage(&stats, dataset, max_gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(dataset: &str, pin: f64) -> StatsRecord {
        StatsRecord {
            dataset: dataset.into(),
            pin,
            mode: 1.0,
            min: 1.0,
            max: 1.0,
        }
    }

    #[test]
    fn single_gap_reported() {
        let gaps = find_gaps(&[100.0, 200.0, 800.0], 500.0);
        assert_eq!(
            gaps,
            vec![PinGap {
                from: 200.0,
                to: 800.0,
                diff: 600.0
            }]
        );
        assert_eq!(gaps[0].to_string(), "200 → 800  (diff 600 W)");
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(find_gaps(&[0.0, 500.0], 500.0).is_empty());
        assert!(find_gaps(&[], 500.0).is_empty());
        assert!(find_gaps(&[42.0], 500.0).is_empty());
    }

    #[test]
    fn unknown_dataset_lists_available() {
        let stats = vec![record("A", 1.0), record("ALL", 1.0)];
        let err = coverage(&stats, "Z", 500.0).unwrap_err();
        assert!(err.to_string().contains("A, ALL"));
    }

    #[test]
    fn coverage_uses_dataset_rows_only() {
        let stats = vec![
            record("ALL", 800.0),
            record("ALL", 100.0),
            record("A", 5000.0),
            record("ALL", 200.0),
        ];
        let cov = coverage(&stats, "ALL", 500.0).unwrap();
        assert_eq!(cov.pins, vec![100.0, 200.0, 800.0]);
        assert_eq!(cov.gaps.len(), 1);
    }
}
