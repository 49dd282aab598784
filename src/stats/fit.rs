/// Least-squares straight line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient of `x` and `y`.
    pub corr: f64,
    pub count: usize,
}

impl LinearFit {
    pub fn r_squared(&self) -> f64 {
        self.corr * self.corr
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a first-degree polynomial. Returns `None` for fewer than two points,
/// mismatched lengths, or when all `x` are equal.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let corr = if syy == 0.0 {
        f64::NAN
    } else {
        sxy / (sxx * syy).sqrt()
    };
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
        corr,
        count: x.len(),
    })
}
