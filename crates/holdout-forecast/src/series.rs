//! Forecast series and model identifiers.

use crate::error::{ForecastError, Result};
use holdout_data::{Asset, Month};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the model that produced a forecast series.
///
/// The `Display` form is the column header used in exported tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// Historical mean (the benchmark)
    Mean,
    /// Univariate predictive regression on one predictor
    Ols {
        /// Predictor column
        predictor: String,
    },
    /// Equal-weight average of the univariate regressions
    Combined,
    /// L1-penalized regression on all predictors
    Lasso,
    /// L2-penalized regression on all predictors
    Ridge,
}

impl ModelId {
    /// Univariate regression model on `predictor`.
    pub fn ols(predictor: impl Into<String>) -> Self {
        Self::Ols {
            predictor: predictor.into(),
        }
    }

    /// Whether this is the benchmark model.
    pub const fn is_benchmark(&self) -> bool {
        matches!(self, Self::Mean)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => f.write_str("Mean_Forecast"),
            Self::Ols { predictor } => write!(f, "Forecast_{predictor}"),
            Self::Combined => f.write_str("Combined_Forecast"),
            Self::Lasso => f.write_str("Lasso"),
            Self::Ridge => f.write_str("Ridge"),
        }
    }
}

/// Forecasts of a single (model, asset) pair, one per covered month.
///
/// A model that needs a predictor value missing at some month skips that month,
/// so a series may cover only part of the out-of-sample grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    model: ModelId,
    asset: Asset,
    dates: Vec<Month>,
    values: Vec<f64>,
}

impl ForecastSeries {
    /// Create a series. Dates must be strictly increasing and match `values` in length.
    pub fn new(model: ModelId, asset: Asset, dates: Vec<Month>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::LengthMismatch {
                expected: dates.len(),
                actual: values.len(),
            });
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ForecastError::Misaligned {
                model,
                asset,
                reason: format!("dates not increasing at {} -> {}", pair[0], pair[1]),
            });
        }

        Ok(Self {
            model,
            asset,
            dates,
            values,
        })
    }

    /// Producing model.
    pub const fn model(&self) -> &ModelId {
        &self.model
    }

    /// Forecast asset.
    pub const fn asset(&self) -> Asset {
        self.asset
    }

    /// Forecast months.
    pub fn dates(&self) -> &[Month] {
        &self.dates
    }

    /// Forecast values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of forecasts.
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty.
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent forecast.
    pub fn last(&self) -> Option<(Month, f64)> {
        self.dates.last().copied().zip(self.values.last().copied())
    }

    /// Forecast for a given month.
    pub fn value_at(&self, month: Month) -> Option<f64> {
        self.dates
            .binary_search(&month)
            .ok()
            .map(|i| self.values[i])
    }

    /// Positions of `other`'s months within this series.
    ///
    /// `other` may skip months this series covers, but a month outside this
    /// series is [`ForecastError::Misaligned`].
    pub fn positions_of(&self, other: &Self) -> Result<Vec<usize>> {
        other
            .dates
            .iter()
            .map(|date| {
                self.dates
                    .binary_search(date)
                    .map_err(|_| ForecastError::Misaligned {
                        model: other.model.clone(),
                        asset: other.asset,
                        reason: format!(
                            "forecast for {date} outside {:?}..{:?}",
                            self.dates.first(),
                            self.dates.last(),
                        ),
                    })
            })
            .collect()
    }
}
