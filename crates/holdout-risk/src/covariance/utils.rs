//! Linear algebra helpers for small covariance matrices

use super::CovarianceError;
use ndarray::Array2;

/// Pivots smaller than this fraction of the largest entry are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// # Arguments
/// * `matrix` - Square matrix to invert
///
/// # Returns
/// * The inverse, or [`CovarianceError::Singular`] when a pivot vanishes
pub fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    if n == 0 {
        return Err(CovarianceError::Singular);
    }

    let scale = matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(CovarianceError::Singular);
    }

    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        // Partial pivoting
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }
        let pivot = a[[pivot_row, col]];
        if pivot.abs() <= PIVOT_TOLERANCE * scale {
            return Err(CovarianceError::Singular);
        }
        if pivot_row != col {
            swap_rows(&mut a, pivot_row, col);
            swap_rows(&mut inv, pivot_row, col);
        }

        for j in 0..n {
            a[[col, j]] /= pivot;
            inv[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[[row, j]] -= factor * a[[col, j]];
                inv[[row, j]] -= factor * inv[[col, j]];
            }
        }
    }

    Ok(inv)
}

fn swap_rows(matrix: &mut Array2<f64>, i: usize, j: usize) {
    for col in 0..matrix.ncols() {
        matrix.swap([i, col], [j, col]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inverse_of_2x2() {
        let m = array![[0.04, 0.01], [0.01, 0.02]];
        let inv = invert(&m).unwrap();
        let identity = m.dot(&inv);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[[i, j]], expected, epsilon = 1e-12);
            }
        }
        // det = 0.0007
        assert_relative_eq!(inv[[0, 0]], 0.02 / 0.0007, max_relative = 1e-12);
        assert_relative_eq!(inv[[0, 1]], -0.01 / 0.0007, max_relative = 1e-12);
    }

    #[test]
    fn test_pivoting_handles_zero_diagonal() {
        let m = array![[0.0, 1.0], [1.0, 0.0]];
        let inv = invert(&m).unwrap();
        assert_relative_eq!(inv[[0, 1]], 1.0);
        assert_relative_eq!(inv[[1, 0]], 1.0);
    }

    #[test]
    fn test_singular_and_non_square() {
        assert!(matches!(
            invert(&array![[1.0, 2.0], [2.0, 4.0]]),
            Err(CovarianceError::Singular)
        ));
        assert!(matches!(
            invert(&Array2::<f64>::zeros((2, 2))),
            Err(CovarianceError::Singular)
        ));
        assert!(matches!(
            invert(&Array2::<f64>::zeros((2, 3))),
            Err(CovarianceError::DimensionMismatch { .. })
        ));
    }
}
