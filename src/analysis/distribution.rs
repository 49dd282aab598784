use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::filter::{pin_matches, PinRange, ALL_DATASETS};
use crate::data::model::{PinKey, ValueRecord};
use crate::error::{PipelineError, Result};
use crate::stats::{linspace, GaussianKde};

/// One sample of a density curve in log10 space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub group: String,
    pub log10_value: f64,
    pub density: f64,
}

/// KDE curve of the log10 values of one group, sampled over their range.
/// `None` when the group cannot support a KDE.
pub fn log_density_curve(group: &str, values: &[f64], grid_points: usize) -> Option<Vec<CurvePoint>> {
    let logs: Vec<f64> = values.iter().map(|v| v.log10()).collect();
    let kde = GaussianKde::fit(&logs)?;
    let (lo, hi) = kde.range();
    Some(
        linspace(lo, hi, grid_points)
            .into_iter()
            .map(|x| CurvePoint {
                group: group.to_string(),
                log10_value: x,
                density: kde.evaluate(x),
            })
            .collect(),
    )
}

/// One curve per Pin of `dataset` (all datasets for `ALL`) within `range`.
/// Expects rows already reduced to positive density values. Pins with fewer
/// than two values, or without spread, are skipped.
pub fn curves_by_pin(
    rows: &[ValueRecord],
    dataset: &str,
    range: PinRange,
    grid_points: usize,
) -> Result<Vec<CurvePoint>> {
    let selected: Vec<&ValueRecord> = rows
        .iter()
        .filter(|r| dataset == ALL_DATASETS || r.dataset == dataset)
        .collect();
    if selected.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "Dataset '{dataset}' has no electron-density values."
        )));
    }

    let mut by_pin: BTreeMap<PinKey, Vec<f64>> = BTreeMap::new();
    for row in selected.into_iter().filter(|r| range.contains(r.pin)) {
        by_pin.entry(PinKey(row.pin)).or_default().push(row.value);
    }

    let curves: Vec<CurvePoint> = by_pin
        .iter()
        .filter(|(_, values)| values.len() >= 2)
        .filter_map(|(pin, values)| log_density_curve(&pin.to_string(), values, grid_points))
        .flatten()
        .collect();
    if curves.is_empty() {
        return Err(PipelineError::EmptyData(
            "No data available in the selected Pin range.".into(),
        ));
    }
    Ok(curves)
}

/// One curve per dataset at a single Pin. Every requested dataset must have
/// at least two values at that Pin.
pub fn curves_by_dataset(
    rows: &[ValueRecord],
    datasets: &[String],
    pin: f64,
    grid_points: usize,
) -> Result<Vec<CurvePoint>> {
    let mut curves = Vec::new();
    for dataset in datasets {
        let values: Vec<f64> = rows
            .iter()
            .filter(|r| &r.dataset == dataset && pin_matches(r.pin, pin))
            .map(|r| r.value)
            .collect();
        let insufficient = || {
            PipelineError::EmptyData(format!(
                "Dataset '{dataset}' has insufficient positive values at Pin={pin}."
            ))
        };
        if values.len() < 2 {
            return Err(insufficient());
        }
        curves.extend(log_density_curve(dataset, &values, grid_points).ok_or_else(insufficient)?);
    }
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(dataset: &str, pin: f64, value: f64) -> ValueRecord {
        ValueRecord {
            dataset: dataset.into(),
            pin,
            field_name: "electron_density".into(),
            value,
        }
    }

    #[test]
    fn curve_spans_log_range() {
        let curve = log_density_curve("x", &[1e14, 1e15, 1e16], 5).unwrap();
        assert_eq!(curve.len(), 5);
        assert_relative_eq!(curve[0].log10_value, 14.0, epsilon = 1e-12);
        assert_relative_eq!(curve[4].log10_value, 16.0, epsilon = 1e-12);
        assert!(curve.iter().all(|p| p.density > 0.0));
    }

    #[test]
    fn pins_filtered_by_dataset_and_range() {
        let rows = vec![
            row("A", 100.0, 1e15),
            row("A", 100.0, 2e15),
            row("A", 300.0, 1e15),
            row("A", 300.0, 5e15),
            row("A", 500.0, 1e15),
            row("B", 100.0, 9e15),
        ];
        let range = PinRange {
            min: None,
            max: Some(300.0),
        };
        let curves = curves_by_pin(&rows, "A", range, 10).unwrap();
        let groups: Vec<&str> = curves.iter().map(|c| c.group.as_str()).collect();
        assert_eq!(groups.iter().filter(|g| **g == "100").count(), 10);
        assert_eq!(groups.iter().filter(|g| **g == "300").count(), 10);
        assert_eq!(curves.len(), 20);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let rows = vec![row("A", 100.0, 1e15)];
        assert!(curves_by_pin(&rows, "Z", PinRange::default(), 10).is_err());
        assert!(curves_by_pin(&rows, "A", PinRange::default(), 10).is_err());
    }

    #[test]
    fn dataset_comparison_requires_two_values() {
        let rows = vec![
            row("r2=32", 500.0, 1e15),
            row("r2=32", 500.0000001, 3e15),
            row("r2=39", 500.0, 2e15),
        ];
        let ok = curves_by_dataset(&rows, &["r2=32".into()], 500.0, 8).unwrap();
        assert_eq!(ok.len(), 8);
        let err = curves_by_dataset(&rows, &["r2=32".into(), "r2=39".into()], 500.0, 8).unwrap_err();
        assert!(err.to_string().contains("r2=39"));
    }
}
