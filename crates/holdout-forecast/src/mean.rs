//! Historical mean forecasts.
//!
//! The forecast for month `t` is the arithmetic mean of the asset's excess
//! returns over an estimation window strictly before `t`. The expanding variant
//! uses every earlier observation, starting from the first panel row. The rolling
//! variant uses the most recent `W` observations and shrinks near the start of
//! history rather than skipping the forecast.

use crate::error::{ForecastError, Result};
use crate::series::{ForecastSeries, ModelId};
use crate::window::{SampleSplit, Window};
use holdout_data::{Asset, Panel};
use tracing::debug;

/// Benchmark mean estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanEstimator {
    window: Window,
}

impl MeanEstimator {
    /// Mean over all prior months.
    pub const fn expanding() -> Self {
        Self {
            window: Window::Expanding,
        }
    }

    /// Mean over the most recent `months` prior months.
    pub fn rolling(months: usize) -> Result<Self> {
        let window = Window::Rolling(months);
        window.validate()?;
        Ok(Self { window })
    }

    /// Window shape.
    pub const fn window(&self) -> Window {
        self.window
    }

    /// Produce one forecast per out-of-sample month.
    ///
    /// Rows with a missing return never enter a window. A month with no usable
    /// prior observation is an [`ForecastError::InsufficientData`] error.
    pub fn forecast(
        &self,
        panel: &Panel,
        asset: Asset,
        split: &SampleSplit,
    ) -> Result<ForecastSeries> {
        let target = panel.excess_returns(asset)?;
        let usable: Vec<usize> = (0..panel.len())
            .filter(|&row| target[row].is_some())
            .collect();
        let rows = split.out_of_sample_rows(panel)?;

        let mut values = Vec::with_capacity(rows.len());
        for t in rows.clone() {
            let sample: Vec<f64> = self
                .window
                .select(&usable, t)
                .iter()
                .filter_map(|&row| target[row])
                .collect();

            let forecast = stable_mean(&sample).ok_or(ForecastError::InsufficientData {
                model: ModelId::Mean,
                asset,
                date: panel.dates()[t],
                required: 1,
                actual: 0,
            })?;
            values.push(forecast);
        }

        debug!(
            asset = %asset,
            window = ?self.window,
            forecasts = values.len(),
            "mean forecasts"
        );
        ForecastSeries::new(ModelId::Mean, asset, panel.dates()[rows].to_vec(), values)
    }
}

/// Arithmetic mean accumulated around the first observation.
///
/// A constant sample yields its value exactly.
pub(crate) fn stable_mean(values: &[f64]) -> Option<f64> {
    let (&origin, _) = values.split_first()?;
    let offset = values.iter().map(|v| v - origin).sum::<f64>() / values.len() as f64;
    Some(origin + offset)
}
