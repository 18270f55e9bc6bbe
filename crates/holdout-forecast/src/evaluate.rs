//! Mean squared forecast error and MSFE ratios.

use crate::error::{ForecastError, Result};
use crate::series::{ForecastSeries, ModelId};
use holdout_data::{Asset, Panel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// MSFE of one model for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsfeRecord {
    /// Forecast asset
    pub asset: Asset,
    /// Evaluated model
    pub model: ModelId,
    /// Mean squared forecast error
    pub msfe: f64,
    /// MSFE divided by the benchmark's MSFE for the same asset
    pub ratio: f64,
}

/// Realized excess returns aligned to a forecast series.
///
/// The actual series is taken from the end: the `n` observations ending at the
/// forecast's last month, where `n` is the number of forecasts. The first of
/// those rows must fall on the forecast's first month, otherwise the series are
/// misaligned. A missing actual return inside the window is an error.
pub fn align_actuals(panel: &Panel, forecast: &ForecastSeries) -> Result<Vec<f64>> {
    let misaligned = |reason: String| ForecastError::Misaligned {
        model: forecast.model().clone(),
        asset: forecast.asset(),
        reason,
    };

    let (last, _) = forecast
        .last()
        .ok_or_else(|| ForecastError::Empty(format!("{} has no forecasts", forecast.model())))?;
    let end = panel.require_position(last)? + 1;
    let start = end.checked_sub(forecast.len()).ok_or_else(|| {
        misaligned(format!(
            "{} forecasts but only {end} panel rows up to {last}",
            forecast.len()
        ))
    })?;

    let dates = &panel.dates()[start..end];
    if dates != forecast.dates() {
        return Err(misaligned(format!(
            "actuals cover {}..{last}, forecasts start at {}",
            dates[0],
            forecast.dates()[0]
        )));
    }

    let column = forecast.asset().excess_return_column();
    let actuals = panel.column(column)?;
    (start..end)
        .map(|row| {
            actuals[row].ok_or_else(|| ForecastError::MissingValue {
                column: column.to_string(),
                date: panel.dates()[row],
            })
        })
        .collect()
}

/// Mean of squared differences between `actuals` and `forecasts`.
pub fn msfe(actuals: &[f64], forecasts: &[f64]) -> Result<f64> {
    if actuals.len() != forecasts.len() {
        return Err(ForecastError::LengthMismatch {
            expected: actuals.len(),
            actual: forecasts.len(),
        });
    }
    if actuals.is_empty() {
        return Err(ForecastError::Empty("no forecasts to evaluate".to_string()));
    }

    let sse: f64 = actuals
        .iter()
        .zip(forecasts)
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok(sse / actuals.len() as f64)
}

/// MSFE records for the benchmark and every candidate of one asset.
///
/// The benchmark's MSFE is computed once and divides every candidate's MSFE; its
/// own record has ratio 1. A candidate is scored over the months it covers,
/// which must be benchmark months. A zero benchmark MSFE with candidates present
/// is a [`ForecastError::ZeroBenchmarkMsfe`].
pub fn evaluate_msfe(
    panel: &Panel,
    benchmark: &ForecastSeries,
    candidates: &[ForecastSeries],
) -> Result<Vec<MsfeRecord>> {
    let asset = benchmark.asset();
    let actuals = align_actuals(panel, benchmark)?;
    let benchmark_msfe = msfe(&actuals, benchmark.values())?;

    let mut records = Vec::with_capacity(candidates.len() + 1);
    records.push(MsfeRecord {
        asset,
        model: benchmark.model().clone(),
        msfe: benchmark_msfe,
        ratio: 1.0,
    });

    if candidates.is_empty() {
        return Ok(records);
    }
    if benchmark_msfe == 0.0 {
        return Err(ForecastError::ZeroBenchmarkMsfe { asset });
    }

    for candidate in candidates {
        if candidate.asset() != asset {
            return Err(ForecastError::Misaligned {
                model: candidate.model().clone(),
                asset: candidate.asset(),
                reason: format!("evaluated against the {asset} benchmark"),
            });
        }
        let matched: Vec<f64> = benchmark
            .positions_of(candidate)?
            .into_iter()
            .map(|i| actuals[i])
            .collect();

        let value = msfe(&matched, candidate.values())?;
        records.push(MsfeRecord {
            asset,
            model: candidate.model().clone(),
            msfe: value,
            ratio: value / benchmark_msfe,
        });
    }

    debug!(asset = %asset, benchmark_msfe, models = candidates.len(), "MSFE evaluated");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use holdout_data::{Month, columns};

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    fn panel(stocks: Vec<Option<f64>>) -> Panel {
        let mut dates = Vec::with_capacity(stocks.len());
        let mut current = ym(2000, 1);
        for _ in 0..stocks.len() {
            dates.push(current);
            current = current.succ().unwrap();
        }
        Panel::new(dates)
            .unwrap()
            .with_column(columns::EXCESS_RETURN_STOCKS, stocks)
            .unwrap()
    }

    fn series(model: ModelId, start: Month, values: Vec<f64>) -> ForecastSeries {
        let mut dates = Vec::with_capacity(values.len());
        let mut current = start;
        for _ in 0..values.len() {
            dates.push(current);
            current = current.succ().unwrap();
        }
        ForecastSeries::new(model, Asset::Stocks, dates, values).unwrap()
    }

    #[test]
    fn test_msfe() {
        assert_relative_eq!(msfe(&[1.0, 2.0], &[0.0, 4.0]).unwrap(), 2.5);
        assert!(matches!(
            msfe(&[1.0], &[1.0, 2.0]),
            Err(ForecastError::LengthMismatch { .. })
        ));
        assert!(matches!(msfe(&[], &[]), Err(ForecastError::Empty(_))));
    }

    #[test]
    fn test_align_actuals_takes_trailing_rows() {
        let panel = panel(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]);
        let forecast = series(ModelId::Mean, ym(2000, 3), vec![0.0, 0.0, 0.0]);
        assert_eq!(align_actuals(&panel, &forecast).unwrap(), vec![3.0, 4.0, 5.0]);

        // Ending before the panel does: the window ends at the forecast's last month
        let early = series(ModelId::Mean, ym(2000, 2), vec![0.0, 0.0]);
        assert_eq!(align_actuals(&panel, &early).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_align_actuals_calendar_correspondence() {
        let panel = panel(vec![Some(1.0), Some(2.0), Some(3.0)]);
        let forecast = series(ModelId::Mean, ym(2000, 1), vec![0.0, 0.0, 0.0]);
        let actuals = align_actuals(&panel, &forecast).unwrap();
        for (i, date) in forecast.dates().iter().enumerate() {
            let row = panel.position(*date).unwrap();
            assert_eq!(
                Some(actuals[i]),
                panel.column(columns::EXCESS_RETURN_STOCKS).unwrap()[row]
            );
        }
    }

    #[test]
    fn test_align_actuals_errors() {
        let panel = panel(vec![Some(1.0), None, Some(3.0)]);
        let forecast = series(ModelId::Mean, ym(2000, 2), vec![0.0, 0.0]);
        assert!(matches!(
            align_actuals(&panel, &forecast),
            Err(ForecastError::MissingValue { .. })
        ));

        let too_long = series(ModelId::Mean, ym(1999, 12), vec![0.0; 4]);
        assert!(align_actuals(&panel, &too_long).is_err());
    }

    #[test]
    fn test_ratios_against_benchmark() {
        let panel = panel(vec![Some(0.0), Some(1.0), Some(-1.0), Some(2.0)]);
        let benchmark = series(ModelId::Mean, ym(2000, 2), vec![0.0, 0.0, 0.0]);
        let candidate = series(ModelId::ols("x"), ym(2000, 2), vec![1.0, -1.0, 1.0]);

        let records = evaluate_msfe(&panel, &benchmark, &[candidate]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].model, ModelId::Mean);
        assert_relative_eq!(records[0].msfe, 2.0);
        assert_relative_eq!(records[0].ratio, 1.0);
        assert_relative_eq!(records[1].msfe, 1.0 / 3.0);
        assert_relative_eq!(records[1].ratio, 1.0 / 6.0);
        assert_relative_eq!(records[1].ratio * records[0].msfe, records[1].msfe);
    }

    #[test]
    fn test_zero_benchmark_msfe_is_guarded() {
        let panel = panel(vec![Some(0.01); 4]);
        let benchmark = series(ModelId::Mean, ym(2000, 3), vec![0.01, 0.01]);
        let candidate = series(ModelId::Combined, ym(2000, 3), vec![0.0, 0.0]);

        let alone = evaluate_msfe(&panel, &benchmark, &[]).unwrap();
        assert_eq!(alone[0].msfe, 0.0);
        assert!(matches!(
            evaluate_msfe(&panel, &benchmark, &[candidate]),
            Err(ForecastError::ZeroBenchmarkMsfe {
                asset: Asset::Stocks
            })
        ));
    }

    #[test]
    fn test_gapped_candidate_scored_over_covered_months() {
        let panel = panel(vec![Some(0.0), Some(1.0), Some(-1.0), Some(2.0)]);
        let benchmark = series(ModelId::Mean, ym(2000, 2), vec![0.0, 0.0, 0.0]);
        let candidate = ForecastSeries::new(
            ModelId::ols("tbl"),
            Asset::Stocks,
            vec![ym(2000, 2), ym(2000, 4)],
            vec![0.0, 1.0],
        )
        .unwrap();

        let records = evaluate_msfe(&panel, &benchmark, &[candidate]).unwrap();
        // (1 - 0)² and (2 - 1)² over two months
        assert_relative_eq!(records[1].msfe, 1.0);
        assert_relative_eq!(records[1].ratio, 0.5);
    }

    #[test]
    fn test_misaligned_candidate() {
        let panel = panel(vec![Some(0.0), Some(1.0), Some(2.0)]);
        let benchmark = series(ModelId::Mean, ym(2000, 2), vec![0.0, 0.0]);
        let candidate = series(ModelId::Lasso, ym(2000, 1), vec![0.0, 0.0]);
        assert!(matches!(
            evaluate_msfe(&panel, &benchmark, &[candidate]),
            Err(ForecastError::Misaligned { .. })
        ));
    }
}
