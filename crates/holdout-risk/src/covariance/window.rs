//! Recursive and rolling window covariance series.
//!
//! For every window end `e` from `initial_window` to the panel length, the
//! estimator sees:
//!
//! - **Recursive**: rows `[1, e)`. Row 0 is always left out, so the first
//!   matrix covers `initial_window − 1` months.
//! - **Rolling**: rows `[e − initial_window, e)`.
//!
//! Rows missing either excess return are dropped inside the window. Each matrix
//! is keyed by the month of row `e − 1`.

use super::{CovarianceError, CovarianceEstimator, SampleCovariance};
use holdout_data::{Asset, Month, Panel};
use ndarray::{Array2, array};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// How the estimation window moves through the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceWindow {
    /// Expanding window anchored at row 1
    Recursive,
    /// Fixed-length window ending at each row
    Rolling,
}

/// Window covariance configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovarianceConfig {
    /// First window end, and the rolling window length (default: 242)
    pub initial_window: usize,
    /// Window scheme (default: recursive)
    pub window: CovarianceWindow,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self {
            initial_window: 242,
            window: CovarianceWindow::Recursive,
        }
    }
}

impl CovarianceConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<(), CovarianceError> {
        if self.initial_window < 2 {
            return Err(CovarianceError::InvalidParameter(format!(
                "covariance window must span at least 2 months, got {}",
                self.initial_window
            )));
        }
        Ok(())
    }
}

/// Covariance of stock and bond excess returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    /// Variance of stock excess returns
    pub var_stocks: f64,
    /// Covariance, stocks row
    pub cov_stocks_bonds: f64,
    /// Covariance, bonds row
    pub cov_bonds_stocks: f64,
    /// Variance of bond excess returns
    pub var_bonds: f64,
}

impl CovarianceMatrix {
    /// Read a 2×2 matrix ordered stocks, bonds.
    pub fn from_array(matrix: &Array2<f64>) -> Result<Self, CovarianceError> {
        if matrix.dim() != (2, 2) {
            return Err(CovarianceError::DimensionMismatch {
                expected: 2,
                actual: matrix.nrows().max(matrix.ncols()),
            });
        }
        Ok(Self {
            var_stocks: matrix[[0, 0]],
            cov_stocks_bonds: matrix[[0, 1]],
            cov_bonds_stocks: matrix[[1, 0]],
            var_bonds: matrix[[1, 1]],
        })
    }

    /// The matrix as a 2×2 array ordered stocks, bonds.
    pub fn to_array(&self) -> Array2<f64> {
        array![
            [self.var_stocks, self.cov_stocks_bonds],
            [self.cov_bonds_stocks, self.var_bonds]
        ]
    }
}

/// Covariance matrices keyed by the last month of their window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CovarianceSeries {
    dates: Vec<Month>,
    matrices: Vec<CovarianceMatrix>,
}

impl CovarianceSeries {
    /// Window end months, ascending.
    pub fn dates(&self) -> &[Month] {
        &self.dates
    }

    /// Matrices in date order.
    pub fn matrices(&self) -> &[CovarianceMatrix] {
        &self.matrices
    }

    /// Number of matrices.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when no window was estimated.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Matrix for a window ending at `date`.
    pub fn get(&self, date: Month) -> Option<&CovarianceMatrix> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| &self.matrices[i])
    }

    /// The most recent matrix.
    pub fn last(&self) -> Option<(Month, &CovarianceMatrix)> {
        self.dates.last().copied().zip(self.matrices.last())
    }

    /// `(date, matrix)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (Month, &CovarianceMatrix)> {
        self.dates.iter().copied().zip(&self.matrices)
    }
}

/// Slides a [`CovarianceEstimator`] over a panel's excess returns.
#[derive(Debug, Clone, Copy)]
pub struct WindowCovariance<E = SampleCovariance> {
    config: CovarianceConfig,
    estimator: E,
}

impl WindowCovariance<SampleCovariance> {
    /// Sample covariance over the configured windows.
    pub const fn new(config: CovarianceConfig) -> Self {
        Self {
            config,
            estimator: SampleCovariance,
        }
    }
}

impl<E: CovarianceEstimator> WindowCovariance<E> {
    /// Get the configuration
    pub const fn config(&self) -> &CovarianceConfig {
        &self.config
    }

    /// Panel rows seen by the window ending before row `end`.
    pub const fn window_rows(&self, end: usize) -> Range<usize> {
        match self.config.window {
            CovarianceWindow::Recursive => 1..end,
            CovarianceWindow::Rolling => end.saturating_sub(self.config.initial_window)..end,
        }
    }

    /// Estimate one matrix per window end.
    ///
    /// # Arguments
    /// * `panel` - Panel holding both excess-return columns
    ///
    /// # Returns
    /// * One matrix per month from row `initial_window − 1` to the last row
    pub fn estimate(&self, panel: &Panel) -> Result<CovarianceSeries, CovarianceError> {
        self.config.validate()?;
        let n = panel.len();
        if self.config.initial_window > n {
            return Err(CovarianceError::InsufficientData {
                required: self.config.initial_window,
                actual: n,
            });
        }

        let stocks = panel.excess_returns(Asset::Stocks)?;
        let bonds = panel.excess_returns(Asset::Bonds)?;

        let windows = n - self.config.initial_window + 1;
        let mut dates = Vec::with_capacity(windows);
        let mut matrices = Vec::with_capacity(windows);

        for end in self.config.initial_window..=n {
            let date = panel.dates()[end - 1];
            let observations: Vec<[f64; 2]> = self
                .window_rows(end)
                .filter_map(|row| Some([stocks[row]?, bonds[row]?]))
                .collect();
            if observations.len() < 2 {
                return Err(CovarianceError::WindowTooShort {
                    date,
                    required: 2,
                    actual: observations.len(),
                });
            }

            let returns = Array2::from(observations);
            let cov = self.estimator.estimate(&returns)?;
            dates.push(date);
            matrices.push(CovarianceMatrix::from_array(&cov)?);
        }

        debug!(
            window = ?self.config.window,
            initial_window = self.config.initial_window,
            matrices = dates.len(),
            "covariance series estimated"
        );
        Ok(CovarianceSeries { dates, matrices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use holdout_data::columns;
    use rstest::rstest;

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    fn panel(rows: &[(Option<f64>, Option<f64>)]) -> Panel {
        let mut dates = Vec::with_capacity(rows.len());
        let mut current = ym(2000, 1);
        for _ in rows {
            dates.push(current);
            current = current.succ().unwrap();
        }
        Panel::new(dates)
            .unwrap()
            .with_column(
                columns::EXCESS_RETURN_STOCKS,
                rows.iter().map(|r| r.0).collect(),
            )
            .unwrap()
            .with_column(
                columns::EXCESS_RETURN_BONDS,
                rows.iter().map(|r| r.1).collect(),
            )
            .unwrap()
    }

    fn four_months() -> Panel {
        panel(&[
            (Some(0.01), Some(0.02)),
            (Some(0.02), Some(0.01)),
            (Some(0.03), Some(0.03)),
            (Some(0.01), Some(0.02)),
        ])
    }

    fn config(initial_window: usize, window: CovarianceWindow) -> CovarianceConfig {
        CovarianceConfig {
            initial_window,
            window,
        }
    }

    #[test]
    fn test_recursive_window_skips_first_row() {
        let series = WindowCovariance::new(config(3, CovarianceWindow::Recursive))
            .estimate(&four_months())
            .unwrap();

        assert_eq!(series.dates(), &[ym(2000, 3), ym(2000, 4)]);

        // Rows 1..3: stocks (0.02, 0.03), bonds (0.01, 0.03)
        let first = series.matrices()[0];
        assert_relative_eq!(first.var_stocks, 0.00005, epsilon = 1e-15);
        assert_relative_eq!(first.var_bonds, 0.0002, epsilon = 1e-15);
        assert_relative_eq!(first.cov_stocks_bonds, 0.0001, epsilon = 1e-15);

        // Rows 1..4
        let (date, last) = series.last().unwrap();
        assert_eq!(date, ym(2000, 4));
        assert_relative_eq!(last.var_stocks, 0.0001, epsilon = 1e-15);
        assert_relative_eq!(last.var_bonds, 0.0001, epsilon = 1e-15);
        assert_relative_eq!(last.cov_stocks_bonds, 0.00005, epsilon = 1e-15);
        assert_eq!(last.cov_stocks_bonds, last.cov_bonds_stocks);
    }

    #[test]
    fn test_rolling_window_has_fixed_length() {
        let estimator = WindowCovariance::new(config(3, CovarianceWindow::Rolling));
        assert_eq!(estimator.window_rows(3), 0..3);
        assert_eq!(estimator.window_rows(4), 1..4);

        let series = estimator.estimate(&four_months()).unwrap();
        assert_eq!(series.len(), 2);
        // Rows 0..3: stocks (0.01, 0.02, 0.03), bonds (0.02, 0.01, 0.03)
        let first = series.get(ym(2000, 3)).unwrap();
        assert_relative_eq!(first.var_stocks, 0.0001, epsilon = 1e-15);
        assert_relative_eq!(first.var_bonds, 0.0001, epsilon = 1e-15);
        assert_relative_eq!(first.cov_stocks_bonds, 0.00005, epsilon = 1e-15);
    }

    #[rstest]
    #[case(CovarianceWindow::Recursive)]
    #[case(CovarianceWindow::Rolling)]
    fn test_one_matrix_per_window_end(#[case] window: CovarianceWindow) {
        let rows: Vec<(Option<f64>, Option<f64>)> = (0..20)
            .map(|i| {
                let x = f64::from(i);
                (Some((x * 0.7).sin() * 0.05), Some((x * 1.3).cos() * 0.02))
            })
            .collect();
        let panel = panel(&rows);
        let series = WindowCovariance::new(config(6, window))
            .estimate(&panel)
            .unwrap();

        assert_eq!(series.len(), 20 - 6 + 1);
        assert_eq!(series.dates(), &panel.dates()[5..]);
        for (_, matrix) in series.iter() {
            assert!(matrix.var_stocks > 0.0);
            assert!(matrix.var_bonds > 0.0);
            assert_eq!(matrix.cov_stocks_bonds, matrix.cov_bonds_stocks);
        }
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let with_gap = panel(&[
            (None, None),
            (Some(0.02), Some(0.01)),
            (Some(0.5), None),
            (Some(0.03), Some(0.03)),
        ]);
        let series = WindowCovariance::new(config(4, CovarianceWindow::Rolling))
            .estimate(&with_gap)
            .unwrap();
        let matrix = series.matrices()[0];
        // Only rows 1 and 3 remain
        assert_relative_eq!(matrix.var_stocks, 0.00005, epsilon = 1e-15);
        assert_relative_eq!(matrix.var_bonds, 0.0002, epsilon = 1e-15);
    }

    #[test]
    fn test_window_longer_than_panel() {
        let err = WindowCovariance::new(config(242, CovarianceWindow::Recursive))
            .estimate(&four_months())
            .unwrap_err();
        assert!(matches!(
            err,
            CovarianceError::InsufficientData {
                required: 242,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_recursive_window_of_two_has_one_row() {
        let err = WindowCovariance::new(config(2, CovarianceWindow::Recursive))
            .estimate(&four_months())
            .unwrap_err();
        match err {
            CovarianceError::WindowTooShort { date, actual, .. } => {
                assert_eq!(date, ym(2000, 2));
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(CovarianceConfig::default().validate().is_ok());
        assert_eq!(CovarianceConfig::default().initial_window, 242);
        assert!(config(1, CovarianceWindow::Rolling).validate().is_err());
    }

    #[test]
    fn test_matrix_array_round_trip() {
        let matrix = CovarianceMatrix {
            var_stocks: 0.04,
            cov_stocks_bonds: 0.01,
            cov_bonds_stocks: 0.01,
            var_bonds: 0.02,
        };
        assert_eq!(CovarianceMatrix::from_array(&matrix.to_array()).unwrap(), matrix);
        assert!(CovarianceMatrix::from_array(&Array2::zeros((3, 3))).is_err());
    }
}
