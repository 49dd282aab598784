//! Numerical building blocks shared by the pipeline and the analyses:
//! descriptive statistics, Gaussian KDE, log-space mode and straight-line fits.

pub mod fit;
pub mod kde;
pub mod mode;
pub mod summary;

pub use fit::{linear_fit, LinearFit};
pub use kde::{linspace, GaussianKde};
pub use mode::{estimate_mode, positive_values, ModeEstimator, DEFAULT_MODE_GRID};
pub use summary::{median, quantile_sorted, Summary};
