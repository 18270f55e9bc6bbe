//! Unbiased sample covariance.

use super::{CovarianceError, CovarianceEstimator};
use ndarray::{Array2, Axis};

/// Sample covariance with the `N − 1` denominator.
///
/// The matrix is filled symmetrically, so `Σ[i][j]` and `Σ[j][i]` are the
/// same number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCovariance;

impl CovarianceEstimator for SampleCovariance {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
        let n = returns.nrows();
        if n < 2 {
            return Err(CovarianceError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let mean = returns
            .mean_axis(Axis(0))
            .ok_or(CovarianceError::InsufficientData {
                required: 2,
                actual: n,
            })?;
        let centered = returns - &mean;
        let k = returns.ncols();
        let denominator = (n - 1) as f64;

        let mut cov = Array2::<f64>::zeros((k, k));
        for i in 0..k {
            for j in i..k {
                let value = centered.column(i).dot(&centered.column(j)) / denominator;
                cov[[i, j]] = value;
                cov[[j, i]] = value;
            }
        }
        Ok(cov)
    }
}
