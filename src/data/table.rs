use crate::error::{PipelineError, Result};
use crate::stats::{estimate_mode, Summary};

use super::model::{CaseValueRow, DensityField, FieldStatsRow, PointValueRow};

/// Rows produced for one case.
#[derive(Debug, Clone, Default)]
pub struct CaseTables {
    pub values: Vec<PointValueRow>,
    pub stats: Vec<FieldStatsRow>,
}

impl CaseTables {
    /// Per-point rows with the statistics of their field merged in.
    pub fn merged_values(&self) -> Vec<CaseValueRow> {
        self.values
            .iter()
            .filter_map(|row| {
                self.stats
                    .iter()
                    .find(|s| s.time_step == row.time_step)
                    .map(|s| CaseValueRow::merge(row, s))
            })
            .collect()
    }
}

/// Pair each density field with its Pin value and flatten to point rows.
///
/// Fields and Pins are paired by position. Non-finite samples are dropped;
/// surviving rows keep their original point index. `dataset` is copied into
/// every row.
pub fn build_tables(
    dataset: &str,
    fields: &[DensityField],
    pins: &[f64],
    mode_grid: usize,
) -> Result<CaseTables> {
    if fields.len() != pins.len() {
        return Err(PipelineError::CountMismatch {
            pins: pins.len(),
            fields: fields.len(),
        });
    }

    let mut tables = CaseTables::default();

    for (i, (field, &pin)) in fields.iter().zip(pins).enumerate() {
        let time_step = i + 1;
        let finite: Vec<(usize, f64)> = field
            .values
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .collect();

        let valid: Vec<f64> = finite.iter().map(|&(_, v)| v).collect();
        let summary = Summary::from_values(&valid)
            .ok_or_else(|| PipelineError::EmptyField(field.name.clone()))?;

        tables.stats.push(FieldStatsRow {
            pin,
            field_name: field.name.clone(),
            time_step,
            total_points: field.values.len(),
            valid_points: summary.count,
            missing_points: field.values.len() - summary.count,
            mean: summary.mean,
            mode: estimate_mode(&valid, mode_grid),
            std: summary.std,
            min: summary.min,
            q1: summary.q1,
            median: summary.median,
            q3: summary.q3,
            max: summary.max,
        });

        tables
            .values
            .extend(finite.into_iter().map(|(point_index, value)| PointValueRow {
                dataset: dataset.to_string(),
                pin,
                field_name: field.name.clone(),
                time_step,
                point_index,
                value,
            }));
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DEFAULT_MODE_GRID;

    fn field(name: &str, values: Vec<f64>) -> DensityField {
        DensityField {
            name: name.into(),
            values,
        }
    }

    #[test]
    fn count_mismatch_yields_no_rows() {
        let fields = vec![field("electron_density_1", vec![1.0]), field("electron_density_2", vec![2.0])];
        let err = build_tables("A", &fields, &[100.0], DEFAULT_MODE_GRID).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CountMismatch { pins: 1, fields: 2 }
        ));
    }

    #[test]
    fn non_finite_points_are_dropped_and_indices_kept() {
        let fields = vec![field(
            "electron_density",
            vec![f64::NAN, 1e15, f64::INFINITY, 3e15],
        )];
        let tables = build_tables("A", &fields, &[250.0], DEFAULT_MODE_GRID).unwrap();
        let indices: Vec<usize> = tables.values.iter().map(|r| r.point_index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert!(tables.values.iter().all(|r| r.value.is_finite()));

        let stats = &tables.stats[0];
        assert_eq!(stats.total_points, 4);
        assert_eq!(stats.valid_points, 2);
        assert_eq!(stats.missing_points, 2);
        assert_eq!(stats.min, 1e15);
        assert_eq!(stats.max, 3e15);
        assert_eq!(stats.time_step, 1);
    }

    #[test]
    fn time_steps_follow_field_order() {
        let fields = vec![field("electron_density_1", vec![1.0]), field("electron_density_5", vec![2.0])];
        let tables = build_tables("B", &fields, &[100.0, 200.0], DEFAULT_MODE_GRID).unwrap();
        let steps: Vec<(usize, f64)> = tables.values.iter().map(|r| (r.time_step, r.pin)).collect();
        assert_eq!(steps, vec![(1, 100.0), (2, 200.0)]);
        assert!(tables.values.iter().all(|r| r.dataset == "B"));
    }

    #[test]
    fn all_nan_field_is_rejected() {
        let fields = vec![field("electron_density", vec![f64::NAN, f64::NAN])];
        assert!(matches!(
            build_tables("A", &fields, &[1.0], DEFAULT_MODE_GRID),
            Err(PipelineError::EmptyField(name)) if name == "electron_density"
        ));
    }

    #[test]
    fn merged_rows_carry_field_stats() {
        let fields = vec![field("electron_density", vec![2.0, 4.0])];
        let tables = build_tables("A", &fields, &[10.0], DEFAULT_MODE_GRID).unwrap();
        let merged = tables.merged_values();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].mean, 3.0);
        assert_eq!(merged[1].valid_points, 2);
    }
}
