//! Diebold-Mariano test of equal predictive accuracy.
//!
//! For a candidate forecast `f₁`, a benchmark `f₂` and actuals `y`:
//! ```text
//! d_i  = (y_i − f₁_i)² − (y_i − f₂_i)²
//! DM   = mean(d) / sqrt(LRV(d))
//! p    = Φ(−|DM|)
//! ```
//! where `LRV` is the [`NeweyWestVariance`] of the mean. The reported p-value is
//! the one-sided normal tail and the null is rejected when it falls below
//! [`REJECTION_THRESHOLD`], which amounts to a two-sided test at the 5% level.

pub mod newey_west;

pub use newey_west::{NeweyWestConfig, NeweyWestVariance};

use crate::error::{ForecastError, Result};
use crate::evaluate::align_actuals;
use crate::series::{ForecastSeries, ModelId};
use holdout_data::{Asset, Panel};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use tracing::debug;

/// One-sided tail probability below which the null is rejected.
pub const REJECTION_THRESHOLD: f64 = 0.025;

/// Outcome label of a Diebold-Mariano test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmConclusion {
    /// Predictive accuracy differs
    Reject,
    /// No evidence of different predictive accuracy
    FailToReject,
}

impl DmConclusion {
    /// Conclusion for a p-value.
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < REJECTION_THRESHOLD {
            Self::Reject
        } else {
            Self::FailToReject
        }
    }
}

impl fmt::Display for DmConclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("Reject H0"),
            Self::FailToReject => f.write_str("Failed to reject H0"),
        }
    }
}

/// Statistic, p-value and conclusion of one test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmOutcome {
    /// DM statistic
    pub statistic: f64,
    /// One-sided standard normal tail `Φ(−|DM|)`
    pub p_value: f64,
    /// Decision at the fixed threshold
    pub conclusion: DmConclusion,
}

/// Test outcome keyed by asset and candidate model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmRecord {
    /// Forecast asset
    pub asset: Asset,
    /// Candidate model tested against the benchmark
    pub model: ModelId,
    /// Test outcome
    pub outcome: DmOutcome,
}

/// Diebold-Mariano tester with a fixed Newey-West lag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DieboldMariano {
    variance: NeweyWestVariance,
}

impl DieboldMariano {
    /// Create a tester with lag truncation `lag`.
    pub const fn new(lag: usize) -> Self {
        Self {
            variance: NeweyWestVariance::new(NeweyWestConfig { lag }),
        }
    }

    /// Squared-error loss differential of `candidate` over `benchmark`.
    pub fn loss_differential(
        actuals: &[f64],
        candidate: &[f64],
        benchmark: &[f64],
    ) -> Result<Vec<f64>> {
        for other in [candidate, benchmark] {
            if other.len() != actuals.len() {
                return Err(ForecastError::LengthMismatch {
                    expected: actuals.len(),
                    actual: other.len(),
                });
            }
        }

        Ok(actuals
            .iter()
            .zip(candidate.iter().zip(benchmark))
            .map(|(y, (f1, f2))| (y - f1).powi(2) - (y - f2).powi(2))
            .collect())
    }

    /// DM statistic of a loss differential.
    ///
    /// An identically zero differential has statistic 0. A non-zero mean with
    /// zero long-run variance is a [`ForecastError::DegenerateVariance`].
    pub fn statistic(&self, differential: &[f64]) -> Result<f64> {
        if differential.is_empty() {
            return Err(ForecastError::Empty("loss differential".to_string()));
        }

        let mean = differential.iter().sum::<f64>() / differential.len() as f64;
        let variance = self.variance.long_run_variance(differential, mean);

        if variance > 0.0 && variance.is_finite() {
            Ok(mean / variance.sqrt())
        } else if mean == 0.0 && variance == 0.0 {
            Ok(0.0)
        } else {
            Err(ForecastError::DegenerateVariance { mean, variance })
        }
    }

    /// Test a loss differential.
    pub fn test_differential(&self, differential: &[f64]) -> Result<DmOutcome> {
        let statistic = self.statistic(differential)?;
        let p_value = standard_normal_cdf(-statistic.abs());
        Ok(DmOutcome {
            statistic,
            p_value,
            conclusion: DmConclusion::from_p_value(p_value),
        })
    }

    /// Test `candidate` against `benchmark` over aligned `actuals`.
    pub fn test(&self, actuals: &[f64], candidate: &[f64], benchmark: &[f64]) -> Result<DmOutcome> {
        let differential = Self::loss_differential(actuals, candidate, benchmark)?;
        self.test_differential(&differential)
    }

    /// Test a candidate series against the benchmark series of the same asset.
    ///
    /// Only the months the candidate covers enter the loss differential.
    pub fn test_series(
        &self,
        panel: &Panel,
        candidate: &ForecastSeries,
        benchmark: &ForecastSeries,
    ) -> Result<DmRecord> {
        if candidate.asset() != benchmark.asset() {
            return Err(ForecastError::Misaligned {
                model: candidate.model().clone(),
                asset: candidate.asset(),
                reason: format!("tested against the {} benchmark", benchmark.asset()),
            });
        }
        let positions = benchmark.positions_of(candidate)?;
        let actuals = align_actuals(panel, benchmark)?;
        let (actuals, reference): (Vec<f64>, Vec<f64>) = positions
            .into_iter()
            .map(|i| (actuals[i], benchmark.values()[i]))
            .unzip();
        let outcome = self.test(&actuals, candidate.values(), &reference)?;
        debug!(
            asset = %candidate.asset(),
            model = %candidate.model(),
            statistic = outcome.statistic,
            p_value = outcome.p_value,
            "Diebold-Mariano test"
        );

        Ok(DmRecord {
            asset: candidate.asset(),
            model: candidate.model().clone(),
            outcome,
        })
    }
}

/// Standard normal CDF.
fn standard_normal_cdf(x: f64) -> f64 {
    // N(0, 1) parameters are always valid
    Normal::new(0.0, 1.0).map_or(f64::NAN, |normal| normal.cdf(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use holdout_data::{Month, columns};

    fn differential() -> Vec<f64> {
        vec![0.3, -0.1, 0.4, 0.2, -0.5, 0.6, 0.1, 0.0, 0.25, -0.05]
    }

    #[test]
    fn test_statistic_matches_formula() {
        let d = differential();
        let dm = DieboldMariano::new(4);
        let mean = d.iter().sum::<f64>() / d.len() as f64;
        let lrv = NeweyWestVariance::new(NeweyWestConfig { lag: 4 }).long_run_variance(&d, mean);

        assert_relative_eq!(dm.statistic(&d).unwrap(), mean / lrv.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_swapping_series_flips_sign_only() {
        let actuals = [0.01, -0.02, 0.03, 0.00, 0.015, -0.01, 0.02];
        let model = [0.00, 0.01, 0.01, 0.02, 0.010, 0.00, 0.01];
        let bench = [0.005; 7];
        let dm = DieboldMariano::new(4);

        let forward = dm.test(&actuals, &model, &bench).unwrap();
        let backward = dm.test(&actuals, &bench, &model).unwrap();

        assert_relative_eq!(forward.statistic, -backward.statistic, epsilon = 1e-12);
        assert_relative_eq!(forward.p_value, backward.p_value, epsilon = 1e-12);
        assert_eq!(forward.conclusion, backward.conclusion);
    }

    #[test]
    fn test_identical_forecasts_give_zero_statistic() {
        let actuals = [0.01; 24];
        let forecast = [0.01; 24];
        let d = DieboldMariano::loss_differential(&actuals, &forecast, &forecast).unwrap();
        assert!(d.iter().all(|v| *v == 0.0));

        let outcome = DieboldMariano::new(4).test_differential(&d).unwrap();
        assert_eq!(outcome.statistic, 0.0);
        assert_relative_eq!(outcome.p_value, 0.5, epsilon = 1e-12);
        assert_eq!(outcome.conclusion, DmConclusion::FailToReject);
    }

    #[test]
    fn test_constant_nonzero_differential_is_degenerate() {
        let err = DieboldMariano::new(4).statistic(&[0.5; 6]).unwrap_err();
        assert!(matches!(err, ForecastError::DegenerateVariance { .. }));
    }

    #[test]
    fn test_p_value_is_one_sided_tail() {
        // Φ(−1.96) ≈ 0.025, the rejection boundary
        assert_relative_eq!(standard_normal_cdf(-1.959_963_985), 0.025, epsilon = 1e-9);
        assert_eq!(DmConclusion::from_p_value(0.0249), DmConclusion::Reject);
        // A two-sided 5% p-value of 0.03 is still not rejected at the halved threshold
        assert_eq!(DmConclusion::from_p_value(0.03), DmConclusion::FailToReject);
        assert_eq!(DmConclusion::Reject.to_string(), "Reject H0");
        assert_eq!(
            DmConclusion::FailToReject.to_string(),
            "Failed to reject H0"
        );
    }

    #[test]
    fn test_strong_evidence_rejects() {
        let d: Vec<f64> = (0..60)
            .map(|i| 1.0 + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let outcome = DieboldMariano::new(4).test_differential(&d).unwrap();
        assert!(outcome.statistic > 0.0);
        assert!(outcome.p_value < REJECTION_THRESHOLD);
        assert_eq!(outcome.conclusion, DmConclusion::Reject);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            DieboldMariano::loss_differential(&[1.0, 2.0], &[1.0], &[1.0, 2.0]),
            Err(ForecastError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_series_with_skipped_months() {
        let dates: Vec<Month> = (1..=8).map(|m| Month::new(2001, m).unwrap()).collect();
        let actual = [0.02, -0.01, 0.03, 0.0, 0.01, -0.02, 0.04, 0.01];
        let panel = Panel::new(dates.clone())
            .unwrap()
            .with_dense_column(columns::EXCESS_RETURN_STOCKS, &actual)
            .unwrap();
        let benchmark =
            ForecastSeries::new(ModelId::Mean, Asset::Stocks, dates.clone(), vec![0.005; 8])
                .unwrap();

        // Month three is skipped by the candidate
        let kept = [0, 1, 3, 4, 5, 6, 7];
        let candidate_values = vec![0.01, 0.0, 0.01, 0.02, -0.01, 0.03, 0.0];
        let candidate = ForecastSeries::new(
            ModelId::ols("tbl"),
            Asset::Stocks,
            kept.iter().map(|&i| dates[i]).collect(),
            candidate_values.clone(),
        )
        .unwrap();

        let dm = DieboldMariano::new(4);
        let record = dm.test_series(&panel, &candidate, &benchmark).unwrap();
        let expected = dm
            .test(
                &kept.map(|i| actual[i]),
                &candidate_values,
                &[0.005; 7],
            )
            .unwrap();
        assert_eq!(record.model, ModelId::ols("tbl"));
        assert_relative_eq!(record.outcome.statistic, expected.statistic, epsilon = 1e-12);
    }
}
