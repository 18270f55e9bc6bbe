//! Descriptive statistics of asset excess returns.

use crate::asset::Asset;
use crate::error::{DataError, Result};
use crate::panel::Panel;
use serde::{Deserialize, Serialize};

/// Months per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 12.0;

/// Annualized moments of one asset's monthly excess returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetStatistics {
    /// Monthly mean × 12
    pub annualized_mean: f64,
    /// Monthly sample standard deviation × √12
    pub annualized_volatility: f64,
    /// Annualized mean over annualized volatility
    pub sharpe_ratio: f64,
    /// Biased (population) skewness
    pub skewness: f64,
    /// Biased Pearson kurtosis (3 for a normal distribution)
    pub kurtosis: f64,
    /// Number of non-missing observations
    pub observations: usize,
}

impl AssetStatistics {
    /// Compute statistics over the present values of `returns`.
    ///
    /// Missing values are dropped. Requires at least two observations and a
    /// non-zero standard deviation.
    pub fn from_returns(returns: &[Option<f64>]) -> Result<Self> {
        let values: Vec<f64> = returns.iter().flatten().copied().collect();
        let n = values.len();
        if n < 2 {
            return Err(DataError::InsufficientData {
                statistic: "asset statistics".to_string(),
                required: 2,
                actual: n,
            });
        }

        let nf = n as f64;
        let mean = values.iter().sum::<f64>() / nf;
        let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), x| {
            let d = x - mean;
            let d2 = d * d;
            (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
        });

        let sample_std = (m2 / (nf - 1.0)).sqrt();
        if sample_std == 0.0 {
            return Err(DataError::Degenerate("return volatility".to_string()));
        }

        let (m2, m3, m4) = (m2 / nf, m3 / nf, m4 / nf);
        let annualized_mean = mean * PERIODS_PER_YEAR;
        let annualized_volatility = sample_std * PERIODS_PER_YEAR.sqrt();

        Ok(Self {
            annualized_mean,
            annualized_volatility,
            sharpe_ratio: annualized_mean / annualized_volatility,
            skewness: m3 / m2.powf(1.5),
            kurtosis: m4 / (m2 * m2),
            observations: n,
        })
    }
}

/// Statistics for both assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    /// Per-asset statistics in [`Asset::ALL`] order
    pub assets: Vec<(Asset, AssetStatistics)>,
}

impl AssetSummary {
    /// Compute statistics for every asset in the panel.
    pub fn from_panel(panel: &Panel) -> Result<Self> {
        let assets = Asset::ALL
            .iter()
            .map(|&asset| {
                AssetStatistics::from_returns(panel.excess_returns(asset)?).map(|s| (asset, s))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { assets })
    }

    /// Statistics of one asset.
    pub fn get(&self, asset: Asset) -> Option<&AssetStatistics> {
        self.assets
            .iter()
            .find(|(a, _)| *a == asset)
            .map(|(_, stats)| stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;
    use crate::panel::columns;
    use approx::assert_relative_eq;

    #[test]
    fn test_moments_of_known_sample() {
        // mean 2.5, sample variance 5/3
        let returns = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)];
        let stats = AssetStatistics::from_returns(&returns).unwrap();

        assert_eq!(stats.observations, 4);
        assert_relative_eq!(stats.annualized_mean, 30.0, epsilon = 1e-12);
        assert_relative_eq!(
            stats.annualized_volatility,
            (5.0_f64 / 3.0).sqrt() * 12.0_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(stats.skewness, 0.0, epsilon = 1e-12);
        // Population m4 = 2.5625, m2 = 1.25
        assert_relative_eq!(stats.kurtosis, 2.5625 / 1.5625, epsilon = 1e-12);
        assert_relative_eq!(
            stats.sharpe_ratio,
            stats.annualized_mean / stats.annualized_volatility,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_skewness_sign() {
        let returns = [Some(0.0), Some(0.0), Some(0.0), Some(10.0)];
        let stats = AssetStatistics::from_returns(&returns).unwrap();
        assert!(stats.skewness > 0.0);
    }

    #[test]
    fn test_insufficient_and_degenerate() {
        assert!(matches!(
            AssetStatistics::from_returns(&[Some(1.0), None]),
            Err(DataError::InsufficientData { actual: 1, .. })
        ));
        assert!(matches!(
            AssetStatistics::from_returns(&[Some(0.25); 5]),
            Err(DataError::Degenerate(_))
        ));
    }

    #[test]
    fn test_summary_from_panel() {
        let dates = vec![
            Month::new(2000, 1).unwrap(),
            Month::new(2000, 2).unwrap(),
            Month::new(2000, 3).unwrap(),
        ];
        let panel = Panel::new(dates)
            .unwrap()
            .with_column(
                columns::EXCESS_RETURN_STOCKS,
                vec![None, Some(0.02), Some(-0.01)],
            )
            .unwrap()
            .with_dense_column(columns::EXCESS_RETURN_BONDS, &[0.01, 0.0, 0.005])
            .unwrap();

        let summary = AssetSummary::from_panel(&panel).unwrap();
        assert_eq!(summary.get(Asset::Stocks).unwrap().observations, 2);
        assert_eq!(summary.get(Asset::Bonds).unwrap().observations, 3);
        assert_relative_eq!(
            summary.get(Asset::Bonds).unwrap().annualized_mean,
            0.06,
            epsilon = 1e-12
        );
    }
}
