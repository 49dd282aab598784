use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::data::filter::{available_datasets, PinRange};
use crate::data::model::StatsRecord;
use crate::error::{PipelineError, Result};

/// Statistic column extracted into a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatKind {
    #[default]
    Mode,
    Min,
    Max,
}

impl StatKind {
    pub fn pick(self, record: &StatsRecord) -> f64 {
        match self {
            StatKind::Mode => record.mode,
            StatKind::Min => record.min,
            StatKind::Max => record.max,
        }
    }
}

impl FromStr for StatKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mode" => Ok(StatKind::Mode),
            "min" => Ok(StatKind::Min),
            "max" => Ok(StatKind::Max),
            other => Err(PipelineError::parse("statistic", format!("unknown '{other}'"))),
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatKind::Mode => "mode",
            StatKind::Min => "min",
            StatKind::Max => "max",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub dataset: String,
    pub pin: f64,
    pub value: f64,
}

/// `(pin, stat)` points per dataset, ordered by dataset request then Pin.
/// Non-finite statistic values are left out.
pub fn stat_series(
    stats: &[StatsRecord],
    datasets: &[String],
    stat: StatKind,
    range: PinRange,
) -> Result<Vec<SeriesPoint>> {
    let available = available_datasets(stats);
    let missing: Vec<&str> = datasets
        .iter()
        .filter(|d| !available.contains(*d))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "Datasets not found: {}",
            missing.join(", ")
        )));
    }

    let mut points = Vec::new();
    for dataset in datasets {
        let mut series: Vec<SeriesPoint> = stats
            .iter()
            .filter(|r| &r.dataset == dataset && range.contains(r.pin))
            .map(|r| SeriesPoint {
                dataset: dataset.clone(),
                pin: r.pin,
                value: stat.pick(r),
            })
            .filter(|p| p.value.is_finite())
            .collect();
        series.sort_by(|a, b| a.pin.total_cmp(&b.pin));
        points.extend(series);
    }
    if points.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "No {stat} values in the selected Pin range."
        )));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(dataset: &str, pin: f64, mode: f64) -> StatsRecord {
        StatsRecord {
            dataset: dataset.into(),
            pin,
            mode,
            min: mode / 2.0,
            max: mode * 2.0,
        }
    }

    #[test]
    fn series_sorted_and_filtered() {
        let stats = vec![
            record("r2=32", 300.0, 3.0),
            record("r2=32", 100.0, 1.0),
            record("r2=39", 100.0, f64::NAN),
            record("r2=39", 200.0, 4.0),
        ];
        let datasets = vec!["r2=39".to_string(), "r2=32".to_string()];
        let pts = stat_series(&stats, &datasets, StatKind::Max, PinRange::default()).unwrap();
        let got: Vec<(&str, f64, f64)> = pts.iter().map(|p| (p.dataset.as_str(), p.pin, p.value)).collect();
        assert_eq!(
            got,
            vec![("r2=39", 200.0, 8.0), ("r2=32", 100.0, 2.0), ("r2=32", 300.0, 6.0)]
        );

        let range = PinRange { min: Some(150.0), max: None };
        let pts = stat_series(&stats, &datasets, StatKind::Mode, range).unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn unknown_dataset_rejected() {
        let stats = vec![record("A", 1.0, 1.0)];
        assert!(stat_series(&stats, &["B".into()], StatKind::Mode, PinRange::default()).is_err());
    }

    #[test]
    fn stat_names_parse() {
        assert_eq!("MODE".parse::<StatKind>().unwrap(), StatKind::Mode);
        assert_eq!("max".parse::<StatKind>().unwrap(), StatKind::Max);
        assert!("mean".parse::<StatKind>().is_err());
    }
}
