//! Penalized multivariate regressions.
//!
//! Lasso and Ridge regress the excess return on every predictor jointly. Unlike
//! the mean and OLS estimators they are fit once, on the complete rows of the
//! in-sample period, and the fitted model is applied to every out-of-sample month
//! where all predictors are present.

pub mod lasso;
pub mod ridge;

pub use lasso::LassoRegression;
pub use ridge::RidgeRegression;

use crate::error::{ForecastError, Result};
use crate::series::{ForecastSeries, ModelId};
use crate::window::SampleSplit;
use holdout_data::{Asset, Month, Panel};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted linear model `y = intercept + x·coefficients`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Intercept
    pub intercept: f64,
    /// One coefficient per predictor
    pub coefficients: Array1<f64>,
}

impl LinearFit {
    /// Predicted value for one row of predictors.
    pub fn predict(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.intercept + x.dot(&self.coefficients)
    }

    /// Number of coefficients that are not exactly zero.
    pub fn n_nonzero(&self) -> usize {
        self.coefficients.iter().filter(|c| **c != 0.0).count()
    }
}

/// Column means of `x` and the mean of `y`, with both centered.
pub(crate) fn center(
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Option<(Array2<f64>, Array1<f64>, Array1<f64>, f64)> {
    let x_mean = x.mean_axis(Axis(0))?;
    let y_mean = y.mean()?;
    Some((x - &x_mean, y - y_mean, x_mean, y_mean))
}

/// Penalty applied to the coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Penalty {
    /// L1 penalty
    Lasso,
    /// L2 penalty
    Ridge,
}

impl Penalty {
    /// Both penalties in reporting order.
    pub const ALL: [Self; 2] = [Self::Lasso, Self::Ridge];

    /// Model identifier of forecasts made with this penalty.
    pub const fn model(&self) -> ModelId {
        match self {
            Self::Lasso => ModelId::Lasso,
            Self::Ridge => ModelId::Ridge,
        }
    }
}

/// Penalized regression configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenalizedConfig {
    /// Regularization strength (default: 0.1)
    pub alpha: f64,
    /// Maximum coordinate-descent sweeps for Lasso (default: 1000)
    pub max_iter: usize,
    /// Lasso convergence tolerance on the relative coefficient change (default: 1e-4)
    pub tolerance: f64,
}

impl Default for PenalizedConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            max_iter: 1000,
            tolerance: 1e-4,
        }
    }
}

impl PenalizedConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "penalty strength must be a non-negative number, got {}",
                self.alpha
            )));
        }
        if self.max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lasso needs at least one iteration".to_string(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Lasso tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Fits Lasso or Ridge once on the in-sample period and forecasts every
/// out-of-sample month.
#[derive(Debug, Clone, PartialEq)]
pub struct PenalizedForecaster {
    predictors: Vec<String>,
    config: PenalizedConfig,
}

impl PenalizedForecaster {
    /// Create a forecaster over the given predictor columns.
    pub const fn new(predictors: Vec<String>, config: PenalizedConfig) -> Self {
        Self { predictors, config }
    }

    /// Fit the model on the complete in-sample rows.
    pub fn fit(
        &self,
        panel: &Panel,
        asset: Asset,
        split: &SampleSplit,
        penalty: Penalty,
    ) -> Result<LinearFit> {
        self.config.validate()?;
        if self.predictors.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one predictor is required".to_string(),
            ));
        }

        let target_column = asset.excess_return_column();
        let mut required: Vec<&str> = self.predictors.iter().map(String::as_str).collect();
        required.push(target_column);

        let in_sample = split.in_sample_rows(panel)?;
        let rows: Vec<usize> = panel
            .complete_rows(&required)?
            .into_iter()
            .filter(|row| in_sample.contains(row))
            .collect();

        // Date of the first forecast, used to locate failures
        let date = split.out_sample_start;
        if rows.len() < 2 {
            return Err(ForecastError::InsufficientData {
                model: penalty.model(),
                asset,
                date,
                required: 2,
                actual: rows.len(),
            });
        }

        let x = self.design(panel, &rows)?;
        let target = panel.column(target_column)?;
        let y: Array1<f64> = rows.iter().filter_map(|&row| target[row]).collect();

        let fit = match penalty {
            Penalty::Lasso => LassoRegression::new(
                self.config.alpha,
                self.config.max_iter,
                self.config.tolerance,
            )
            .fit(&x, &y),
            Penalty::Ridge => RidgeRegression::new(self.config.alpha).fit(&x, &y),
        }
        .ok_or(ForecastError::SingularDesign {
            model: penalty.model(),
            asset,
            date,
        })?;

        debug!(
            asset = %asset,
            model = %penalty.model(),
            observations = rows.len(),
            nonzero = fit.n_nonzero(),
            intercept = fit.intercept,
            "penalized fit"
        );
        Ok(fit)
    }

    /// Fit once and forecast every out-of-sample month with complete predictors.
    pub fn forecast(
        &self,
        panel: &Panel,
        asset: Asset,
        split: &SampleSplit,
        penalty: Penalty,
    ) -> Result<ForecastSeries> {
        let fit = self.fit(panel, asset, split, penalty)?;
        let out_of_sample = split.out_of_sample_rows(panel)?;
        let predictors: Vec<&str> = self.predictors.iter().map(String::as_str).collect();
        let rows: Vec<usize> = panel
            .complete_rows(&predictors)?
            .into_iter()
            .filter(|row| out_of_sample.contains(row))
            .collect();
        if rows.len() < out_of_sample.len() {
            debug!(
                asset = %asset,
                model = %penalty.model(),
                skipped = out_of_sample.len() - rows.len(),
                "months with missing predictors skipped"
            );
        }
        let x = self.design(panel, &rows)?;

        let values = x.rows().into_iter().map(|row| fit.predict(row)).collect();
        let dates: Vec<Month> = rows.iter().map(|&row| panel.dates()[row]).collect();
        ForecastSeries::new(penalty.model(), asset, dates, values)
    }

    /// Predictor matrix over `rows`, failing on any missing value.
    fn design(&self, panel: &Panel, rows: &[usize]) -> Result<Array2<f64>> {
        let mut x = Array2::<f64>::zeros((rows.len(), self.predictors.len()));
        for (j, name) in self.predictors.iter().enumerate() {
            let values = panel.column(name)?;
            for (i, &row) in rows.iter().enumerate() {
                x[[i, j]] = values[row].ok_or_else(|| ForecastError::MissingValue {
                    column: name.clone(),
                    date: panel.dates()[row],
                })?;
            }
        }
        Ok(x)
    }
}
