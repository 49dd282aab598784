use super::kde::{linspace, GaussianKde};
use super::summary::median;

/// Grid size used for the log-space density scan.
pub const DEFAULT_MODE_GRID: usize = 512;

/// Which estimator a sample supports, decided before any fitting happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEstimator {
    /// No finite positive values.
    Undefined,
    /// Exactly one finite positive value.
    Single,
    /// Two or more values without spread in log space.
    Median,
    /// Two or more values with spread in log space.
    Kde,
}

impl ModeEstimator {
    /// Pick the estimator for a set of finite, strictly positive values.
    pub fn select(positive: &[f64]) -> Self {
        match positive.len() {
            0 => ModeEstimator::Undefined,
            1 => ModeEstimator::Single,
            _ => {
                let first = positive[0].log10();
                let spread = positive.iter().any(|v| v.log10() != first);
                if spread {
                    ModeEstimator::Kde
                } else {
                    ModeEstimator::Median
                }
            }
        }
    }
}

/// Finite, strictly positive values of a sample.
pub fn positive_values(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect()
}

/// Most probable value of `values`, estimated in log10 space.
///
/// Non-positive and non-finite values are ignored. With at least two
/// distinct positive values a Gaussian KDE is fitted to their base-10 logs and
/// scanned on `grid_points` evenly spaced points between the smallest and
/// largest log value; the first grid maximum is mapped back with `10^x`.
pub fn estimate_mode(values: &[f64], grid_points: usize) -> f64 {
    let positive = positive_values(values);
    match ModeEstimator::select(&positive) {
        ModeEstimator::Undefined => f64::NAN,
        ModeEstimator::Single => positive[0],
        ModeEstimator::Median => median(&positive),
        ModeEstimator::Kde => {
            let logs: Vec<f64> = positive.iter().map(|v| v.log10()).collect();
            match GaussianKde::fit(&logs) {
                Some(kde) => {
                    let (lo, hi) = kde.range();
                    let grid = linspace(lo, hi, grid_points.max(2));
                    let peak = argmax(&kde.evaluate_grid(&grid));
                    10f64.powf(grid[peak])
                }
                None => median(&positive),
            }
        }
    }
}

/// Index of the first maximum. Assumes a non-empty slice.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_value_is_the_mode() {
        assert_eq!(estimate_mode(&[4.2e15], DEFAULT_MODE_GRID), 4.2e15);
        assert_eq!(estimate_mode(&[0.0, -3.0, 7.0, f64::NAN], DEFAULT_MODE_GRID), 7.0);
    }

    #[test]
    fn no_positive_values_is_nan() {
        assert!(estimate_mode(&[], DEFAULT_MODE_GRID).is_nan());
        assert!(estimate_mode(&[0.0, -1.0, f64::INFINITY], DEFAULT_MODE_GRID).is_nan());
    }

    #[test]
    fn identical_values_fall_back_to_median() {
        assert_eq!(
            ModeEstimator::select(&[5e14, 5e14]),
            ModeEstimator::Median
        );
        assert_eq!(estimate_mode(&[5e14, 5e14], DEFAULT_MODE_GRID), 5e14);
    }

    #[test]
    fn mode_tracks_the_dense_cluster() {
        let mut values = vec![1e14, 1e17];
        values.extend((0..40).map(|i| 1e15 * (1.0 + 0.001 * i as f64)));
        let mode = estimate_mode(&values, DEFAULT_MODE_GRID);
        assert_relative_eq!(mode.log10(), 15.0, epsilon = 0.1);
    }

    #[test]
    fn two_point_mode_lies_in_range() {
        let mode = estimate_mode(&[1e15, 2e15], DEFAULT_MODE_GRID);
        assert!((1e15..=2e15).contains(&mode));
    }
}
