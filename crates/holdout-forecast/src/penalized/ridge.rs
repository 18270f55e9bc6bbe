//! Ridge regression (L2 penalty).
//!
//! Minimizes `||y − Xβ − c||² + α||β||²`. The intercept is not penalized: both
//! sides are centered and the system `(XᵀX + αI)β = Xᵀy` is solved by Cholesky
//! decomposition.

use super::{LinearFit, center};
use ndarray::{Array1, Array2};

/// Ridge regression with a fixed penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeRegression {
    alpha: f64,
}

impl RidgeRegression {
    /// Create a model with penalty strength `alpha`.
    pub const fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Fit the model.
    ///
    /// Returns `None` when `XᵀX + αI` is not positive definite, which can only
    /// happen for `α = 0` with collinear predictors.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Option<LinearFit> {
        let (xc, yc, x_mean, y_mean) = center(x, y)?;

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);

        let coefficients = cholesky_solve(&gram, &rhs)?;
        Some(LinearFit {
            intercept: y_mean - x_mean.dot(&coefficients),
            coefficients,
        })
    }
}

/// Solve `a·x = b` for symmetric positive definite `a`.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    // Pivots below this fraction of the largest diagonal entry count as zero
    let scale = (0..n).map(|i| a[[i, i]].abs()).fold(0.0, f64::max);
    let tolerance = scale * 1e-12;

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= tolerance {
                    return None;
                }
                l[[i, i]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L·z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ·x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_zero_penalty_is_ols() {
        #[rustfmt::skip]
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 0.0],
            [4.0, 2.0],
            [5.0, 1.0],
        ];
        let y = x.column(0).mapv(|v| 3.0 * v) - x.column(1).mapv(|v| 2.0 * v) + 1.0;

        let fit = RidgeRegression::new(0.0).fit(&x, &y).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], -2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_penalty_shrinks_single_coefficient() {
        // Centered x = [-1, 0, 1], y = 2x, so XᵀX = 2 and Xᵀy = 4
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0.0, 2.0, 4.0];

        let fit = RidgeRegression::new(2.0).fit(&x, &y).unwrap();
        assert_relative_eq!(fit.coefficients[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_collinear_without_penalty_is_singular() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(RidgeRegression::new(0.0).fit(&x, &y).is_none());
        assert!(RidgeRegression::new(0.1).fit(&x, &y).is_some());
    }
}
