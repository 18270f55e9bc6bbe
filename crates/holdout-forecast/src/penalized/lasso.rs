//! Lasso regression (L1 penalty).
//!
//! Minimizes `(1/2n)||y − Xβ − c||² + α||β||₁` by cyclic coordinate descent on
//! centered data. Each sweep updates one coefficient at a time with the
//! soft-thresholding operator and keeps the residual current.

use super::{LinearFit, center};
use ndarray::{Array1, Array2};
use tracing::warn;

/// Lasso regression with a fixed penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LassoRegression {
    alpha: f64,
    max_iter: usize,
    tolerance: f64,
}

impl LassoRegression {
    /// Create a model.
    ///
    /// # Arguments
    /// * `alpha` - Penalty strength
    /// * `max_iter` - Maximum number of full coordinate sweeps
    /// * `tolerance` - Stop once the largest coefficient change relative to the
    ///   largest coefficient falls below this value
    pub const fn new(alpha: f64, max_iter: usize, tolerance: f64) -> Self {
        Self {
            alpha,
            max_iter,
            tolerance,
        }
    }

    /// Fit the model. Returns `None` only for an empty sample.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Option<LinearFit> {
        let (xc, yc, x_mean, y_mean) = center(x, y)?;
        let n_features = xc.ncols();
        let threshold = self.alpha * xc.nrows() as f64;

        let norms: Vec<f64> = xc
            .columns()
            .into_iter()
            .map(|column| column.dot(&column))
            .collect();

        let mut coefficients = Array1::<f64>::zeros(n_features);
        let mut residual = yc;
        let mut converged = false;

        for _ in 0..self.max_iter {
            let mut max_change: f64 = 0.0;
            let mut max_coefficient: f64 = 0.0;

            for j in 0..n_features {
                if norms[j] == 0.0 {
                    continue;
                }
                let column = xc.column(j);
                let old = coefficients[j];
                let rho = column.dot(&residual) + norms[j] * old;
                let new = soft_threshold(rho, threshold) / norms[j];

                if new != old {
                    residual.scaled_add(old - new, &column);
                    coefficients[j] = new;
                }
                max_change = max_change.max((new - old).abs());
                max_coefficient = max_coefficient.max(new.abs());
            }

            if max_coefficient == 0.0 || max_change / max_coefficient < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                max_iter = self.max_iter,
                alpha = self.alpha,
                "Lasso coordinate descent did not converge"
            );
        }

        Some(LinearFit {
            intercept: y_mean - x_mean.dot(&coefficients),
            coefficients,
        })
    }
}

/// Soft-thresholding operator `sign(x)·max(|x| − λ, 0)`.
fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn test_single_feature_closed_form() {
        // Centered x = [-1, 0, 1], y = 2x: rho = 4, n·α = 3·0.5, ||x||² = 2
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0.0, 2.0, 4.0];

        let fit = LassoRegression::new(0.5, 1000, 1e-10).fit(&x, &y).unwrap();
        assert_relative_eq!(fit.coefficients[0], (4.0 - 1.5) / 2.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 2.0 - 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_large_penalty_zeroes_everything() {
        let x = array![[1.0, 0.5], [2.0, 0.1], [3.0, 0.9], [4.0, 0.3]];
        let y = array![0.1, 0.2, 0.15, 0.3];

        let fit = LassoRegression::new(100.0, 1000, 1e-4).fit(&x, &y).unwrap();
        assert_eq!(fit.n_nonzero(), 0);
        assert_relative_eq!(fit.intercept, 0.1875, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_penalty_approaches_ols() {
        #[rustfmt::skip]
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 0.0],
            [4.0, 2.0],
            [5.0, 1.0],
        ];
        let y = x.column(0).mapv(|v| 3.0 * v) - x.column(1).mapv(|v| 2.0 * v) + 1.0;

        let fit = LassoRegression::new(0.0, 10_000, 1e-12).fit(&x, &y).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[1], -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_feature_is_ignored() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let y = array![1.0, 2.0, 3.0];

        let fit = LassoRegression::new(0.0, 1000, 1e-10).fit(&x, &y).unwrap();
        assert_eq!(fit.coefficients[1], 0.0);
        assert_relative_eq!(fit.coefficients[0], 1.0, epsilon = 1e-9);
    }
}
