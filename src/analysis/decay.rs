use serde::Serialize;

use crate::error::{PipelineError, Result};

use super::slice::RadialSlice;

/// Check that every decay fraction lies strictly between 0 and 1.
pub fn validate_alphas(alphas: &[f64]) -> Result<Vec<f64>> {
    if alphas.is_empty() {
        return Err(PipelineError::EmptyData("no alpha values given".into()));
    }
    alphas
        .iter()
        .map(|&alpha| {
            if alpha > 0.0 && alpha < 1.0 {
                Ok(alpha)
            } else {
                Err(PipelineError::parse(
                    "alpha",
                    format!("{alpha} must be between 0 and 1 (exclusive)"),
                ))
            }
        })
        .collect()
}

/// Radius at which a radial profile first falls to `alpha × peak` beyond its
/// peak, linearly interpolated between the bracketing samples.
///
/// The first crossing after the peak is used even if the tail rises again.
/// Returns `None` for an empty profile or when the density never gets that low.
pub fn decay_radius(r: &[f64], density: &[f64], alpha: f64) -> Option<f64> {
    if density.is_empty() || r.len() != density.len() {
        return None;
    }
    let peak = density
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| if *v > density[best] { i } else { best });
    let threshold = alpha * density[peak];

    let tail_r = &r[peak..];
    let tail_d = &density[peak..];
    let j = tail_d.iter().position(|&d| d <= threshold)?;
    if j == 0 {
        return Some(tail_r[0]);
    }

    let (r0, r1) = (tail_r[j - 1], tail_r[j]);
    let (d0, d1) = (tail_d[j - 1], tail_d[j]);
    if d0 == d1 {
        return Some(r1);
    }
    let t = (threshold - d0) / (d1 - d0);
    Some(r0 + t * (r1 - r0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecayRow {
    pub case: u32,
    pub cavity_radius: f64,
    pub alpha: f64,
    pub decay_radius: f64,
}

/// Decay radii of one slice for each alpha; alphas without a crossing are
/// logged and left out.
pub fn decay_rows(slice: &RadialSlice, alphas: &[f64]) -> Vec<DecayRow> {
    alphas
        .iter()
        .filter_map(|&alpha| match decay_radius(&slice.r, &slice.density, alpha) {
            Some(decay_radius) => Some(DecayRow {
                case: slice.index,
                cavity_radius: slice.cavity_radius,
                alpha,
                decay_radius,
            }),
            None => {
                log::warn!(
                    "case {}: alpha={alpha:.2}: density never fell below {alpha:.2}×peak",
                    slice.index
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::slice::{radial_slice, tests::square_case};
    use approx::assert_relative_eq;

    #[test]
    fn interpolates_between_bracketing_samples() {
        let r = [0.0, 1.0, 2.0, 3.0];
        let d = [2.0, 10.0, 6.0, 2.0];
        // threshold 5 lies between 6 (r=2) and 2 (r=3)
        assert_relative_eq!(decay_radius(&r, &d, 0.5).unwrap(), 2.25, epsilon = 1e-12);
    }

    #[test]
    fn first_crossing_wins_on_non_monotonic_tail() {
        let r = [0.0, 1.0, 2.0, 3.0];
        let d = [10.0, 4.0, 8.0, 1.0];
        assert_relative_eq!(decay_radius(&r, &d, 0.5).unwrap(), 1.0 - 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn no_crossing_and_flat_steps() {
        assert!(decay_radius(&[0.0, 1.0], &[10.0, 9.0], 0.5).is_none());
        assert!(decay_radius(&[], &[], 0.5).is_none());
        // threshold reached exactly at a sample
        assert_eq!(decay_radius(&[0.0, 1.0, 2.0], &[4.0, 2.0, 2.0], 0.5), Some(1.0));
    }

    #[test]
    fn alpha_bounds() {
        assert!(validate_alphas(&[0.5, 0.1]).is_ok());
        assert!(validate_alphas(&[0.0]).is_err());
        assert!(validate_alphas(&[1.0]).is_err());
        assert!(validate_alphas(&[]).is_err());
    }

    #[test]
    fn decay_on_a_linear_profile() {
        let case = square_case(1.0);
        let slice = radial_slice(&case, 0.0, 101).unwrap();
        // density(r) = 10 - 4r at z = 0: falls to 0.7 × 10 = 7 at r = 0.75
        let rows = decay_rows(&slice, &[0.7, 0.1]);
        assert_eq!(rows.len(), 1);
        assert_relative_eq!(rows[0].decay_radius, 0.75, epsilon = 1e-9);
        assert_eq!(rows[0].cavity_radius, 1.0);
    }
}
