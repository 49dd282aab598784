use std::path::Path;

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::stats::linear_fit;

/// Power-law fit `P ≈ coeff · r^slope` obtained in log10–log10 space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerLawFit {
    pub slope: f64,
    pub intercept: f64,
    pub corr: f64,
    pub r_squared: f64,
    /// `10^intercept`.
    pub coeff: f64,
    pub count: usize,
}

/// Fit outcome: the number of points below the cutoff and the fit, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReport {
    pub cutoff: f64,
    pub count: usize,
    pub fit: Option<PowerLawFit>,
}

/// Read `(radius, power)` pairs from the first two columns of a CSV file with
/// a header row, sorted by radius.
pub fn read_radius_power(path: &Path) -> Result<Vec<(f64, f64)>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    if reader.headers()?.len() < 2 {
        return Err(PipelineError::Schema {
            table: path.display().to_string(),
            missing: vec!["radius".into(), "power".into()],
        });
    }

    let mut pairs = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record?;
        let field = |i: usize| -> Result<f64> {
            let raw = record.get(i).unwrap_or("").trim();
            raw.parse::<f64>().map_err(|e| {
                PipelineError::parse(format!("{} row {row_no}", path.display()), format!("'{raw}': {e}"))
            })
        };
        pairs.push((field(0)?, field(1)?));
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(pairs)
}

/// Fit `log10 P` against `log10 r` over the points with `r < cutoff`.
/// Points that cannot be log-transformed are ignored.
pub fn fit_power_law(pairs: &[(f64, f64)], cutoff: f64) -> TrendReport {
    let (log_r, log_p): (Vec<f64>, Vec<f64>) = pairs
        .iter()
        .filter(|(r, p)| *r < cutoff && r.is_finite() && p.is_finite() && *r > 0.0 && *p > 0.0)
        .map(|(r, p)| (r.log10(), p.log10()))
        .unzip();

    let fit = linear_fit(&log_r, &log_p).map(|fit| PowerLawFit {
        slope: fit.slope,
        intercept: fit.intercept,
        corr: fit.corr,
        r_squared: fit.r_squared(),
        coeff: 10f64.powf(fit.intercept),
        count: fit.count,
    });
    TrendReport {
        cutoff,
        count: log_r.len(),
        fit,
    }
}
