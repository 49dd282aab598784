use std::f64::consts::PI;

/// One-dimensional Gaussian kernel density estimate.
///
/// The bandwidth follows Scott's rule: `n^(-1/5)` times the sample standard
/// deviation (ddof = 1).
#[derive(Debug, Clone)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fit a KDE. Returns `None` when the sample cannot support one: fewer
    /// than two values, non-finite input, or zero spread.
    pub fn fit(samples: &[f64]) -> Option<Self> {
        if samples.len() < 2 || samples.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let bandwidth = n.powf(-0.2) * var.sqrt();
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return None;
        }
        Some(GaussianKde {
            samples: samples.to_vec(),
            bandwidth,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / ((2.0 * PI).sqrt() * h * self.samples.len() as f64);
        self.samples
            .iter()
            .map(|s| {
                let u = (x - s) / h;
                (-0.5 * u * u).exp()
            })
            .sum::<f64>()
            * norm
    }

    /// Densities on a grid of points.
    pub fn evaluate_grid(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Smallest and largest sample.
    pub fn range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// `n` evenly spaced points over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scott_bandwidth() {
        let kde = GaussianKde::fit(&[0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        // sample std (ddof=1) of 0..4 is sqrt(2.5)
        assert_relative_eq!(kde.bandwidth(), 5f64.powf(-0.2) * 2.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn density_integrates_to_one() {
        let kde = GaussianKde::fit(&[1.0, 1.5, 2.0, 4.0]).unwrap();
        let grid = linspace(-10.0, 15.0, 5001);
        let dx = grid[1] - grid[0];
        let total: f64 = kde.evaluate_grid(&grid).iter().sum::<f64>() * dx;
        assert_relative_eq!(total, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_samples_are_rejected() {
        assert!(GaussianKde::fit(&[1.0]).is_none());
        assert!(GaussianKde::fit(&[2.0, 2.0, 2.0]).is_none());
        assert!(GaussianKde::fit(&[1.0, f64::NAN]).is_none());
    }

    #[test]
    fn linspace_hits_both_ends() {
        let g = linspace(0.0, 1.0, 5);
        assert_eq!(g, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }
}
