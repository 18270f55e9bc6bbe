//! Recursive univariate predictive regressions.
//!
//! For each out-of-sample month `t` and each predictor `x`, the regression
//! `r = a + b·x` is fit by ordinary least squares on every row from the in-sample
//! start up to `t − 1` where both the return and the predictor are present. The
//! forecast is `a + b·x_t` using the predictor's realized value at `t`. A month
//! where `x_t` is missing gets no forecast from that predictor.

use crate::error::{ForecastError, Result};
use crate::mean::stable_mean;
use crate::series::{ForecastSeries, ModelId};
use crate::window::{SampleSplit, Window};
use holdout_data::{Asset, Month, Panel};
use tracing::debug;

/// Fitted line `y = intercept + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleRegression {
    /// Intercept
    pub intercept: f64,
    /// Slope on the predictor
    pub slope: f64,
}

impl SimpleRegression {
    /// Least-squares fit of `ys` on `xs`.
    ///
    /// Returns `None` when fewer than two points are given or `xs` has no variation.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }

        let x_mean = stable_mean(xs)?;
        let y_mean = stable_mean(ys)?;
        let (sxx, sxy) = xs
            .iter()
            .zip(ys)
            .fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
                let dx = x - x_mean;
                (sxx + dx * dx, sxy + dx * (y - y_mean))
            });

        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            intercept: y_mean - slope * x_mean,
            slope,
        })
    }

    /// Predicted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Re-fits one regression per predictor at every out-of-sample month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveOls {
    predictors: Vec<String>,
}

impl RecursiveOls {
    /// Create an estimator over the given predictor columns.
    pub const fn new(predictors: Vec<String>) -> Self {
        Self { predictors }
    }

    /// Predictor columns.
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Forecast series for every predictor, in predictor order.
    pub fn forecast(
        &self,
        panel: &Panel,
        asset: Asset,
        split: &SampleSplit,
    ) -> Result<Vec<ForecastSeries>> {
        if self.predictors.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one predictor is required".to_string(),
            ));
        }
        self.predictors
            .iter()
            .map(|predictor| self.forecast_predictor(panel, asset, predictor, split))
            .collect()
    }

    /// Forecast series from the regression on a single predictor.
    pub fn forecast_predictor(
        &self,
        panel: &Panel,
        asset: Asset,
        predictor: &str,
        split: &SampleSplit,
    ) -> Result<ForecastSeries> {
        let model = ModelId::ols(predictor);
        let target = panel.excess_returns(asset)?;
        let regressor = panel.column(predictor)?;

        let first = split.first_in_sample_row(panel);
        let usable: Vec<usize> = (first..panel.len())
            .filter(|&row| target[row].is_some() && regressor[row].is_some())
            .collect();
        let rows = split.out_of_sample_rows(panel)?;

        let mut dates = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        for t in rows {
            let date = panel.dates()[t];
            let Some(x_t) = regressor[t] else {
                debug!(asset = %asset, predictor, %date, "predictor missing, month skipped");
                continue;
            };
            let window = Window::Expanding.select(&usable, t);
            if window.len() < 2 {
                return Err(ForecastError::InsufficientData {
                    model,
                    asset,
                    date,
                    required: 2,
                    actual: window.len(),
                });
            }

            let (xs, ys): (Vec<f64>, Vec<f64>) = window
                .iter()
                .filter_map(|&row| regressor[row].zip(target[row]))
                .unzip();
            let fit = SimpleRegression::fit(&xs, &ys).ok_or_else(|| {
                ForecastError::SingularDesign {
                    model: model.clone(),
                    asset,
                    date,
                }
            })?;

            dates.push(date);
            values.push(fit.predict(x_t));
        }

        debug!(
            asset = %asset,
            predictor,
            forecasts = values.len(),
            "recursive OLS forecasts"
        );
        ForecastSeries::new(model, asset, dates, values)
    }
}

/// Equal-weight average of forecast series for the same asset.
///
/// Each month averages the series that cover it, so a predictor skipped at some
/// month drops out of that month's average only. A month no series covers is
/// left out. Fails when the inputs hold no forecasts at all.
pub fn combine(series: &[ForecastSeries]) -> Result<ForecastSeries> {
    let first = series
        .first()
        .ok_or_else(|| ForecastError::Empty("no forecasts to combine".to_string()))?;

    if let Some(other) = series.iter().find(|s| s.asset() != first.asset()) {
        return Err(ForecastError::Misaligned {
            model: other.model().clone(),
            asset: other.asset(),
            reason: format!("cannot combine with {} forecasts", first.asset()),
        });
    }

    let mut dates: Vec<Month> = series.iter().flat_map(|s| s.dates()).copied().collect();
    dates.sort_unstable();
    dates.dedup();
    if dates.is_empty() {
        return Err(ForecastError::Empty(format!(
            "no {} forecasts to combine",
            first.asset()
        )));
    }

    let values = dates
        .iter()
        .map(|&date| {
            let available: Vec<f64> = series.iter().filter_map(|s| s.value_at(date)).collect();
            available.iter().sum::<f64>() / available.len() as f64
        })
        .collect();

    ForecastSeries::new(ModelId::Combined, first.asset(), dates, values)
}
