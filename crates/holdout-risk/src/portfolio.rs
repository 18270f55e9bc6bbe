//! Tangency portfolios
//!
//! Weights are proportional to `Σ⁻¹μ` and normalized to sum to one:
//!
//! w = Σ⁻¹μ / (1ᵀ Σ⁻¹μ)
//!
//! where:
//! - μ = expected monthly excess returns of stocks and bonds
//! - Σ = covariance matrix of their excess returns

use crate::covariance::{CovarianceError, CovarianceMatrix, invert};
use holdout_data::{Asset, DataError, PERIODS_PER_YEAR, Panel};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Portfolio construction errors
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Covariance matrix cannot be inverted
    #[error("Covariance matrix is singular")]
    SingularCovariance,

    /// Raw weights sum to zero, so they cannot be normalized
    #[error("Tangency weights cannot be normalized: raw weights sum to {sum}")]
    DegenerateWeights {
        /// Sum of the raw weights `Σ⁻¹μ`
        sum: f64,
    },

    /// Portfolio returns have zero volatility
    #[error("Portfolio returns have zero volatility")]
    ZeroVolatility,

    /// Insufficient data for portfolio statistics
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Covariance estimation error
    #[error("Covariance error: {0}")]
    Covariance(CovarianceError),

    /// Panel access failed
    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<CovarianceError> for PortfolioError {
    fn from(err: CovarianceError) -> Self {
        match err {
            CovarianceError::Singular => Self::SingularCovariance,
            other => Self::Covariance(other),
        }
    }
}

/// Normalized tangency weights for any number of assets.
///
/// # Arguments
/// * `expected_returns` - Expected excess return per asset (N)
/// * `covariance` - Covariance matrix of the same assets (N x N)
///
/// # Returns
/// * Weights proportional to `Σ⁻¹μ` that sum to one
pub fn tangency_weights(
    expected_returns: &Array1<f64>,
    covariance: &Array2<f64>,
) -> Result<Array1<f64>, PortfolioError> {
    let n = expected_returns.len();
    if covariance.dim() != (n, n) {
        return Err(PortfolioError::DimensionMismatch(format!(
            "{n} expected returns but a {}x{} covariance matrix",
            covariance.nrows(),
            covariance.ncols()
        )));
    }

    let raw = invert(covariance)?.dot(expected_returns);
    let sum = raw.sum();
    let scale: f64 = raw.iter().map(|w| w.abs()).sum();
    if !sum.is_finite() || sum.abs() <= f64::EPSILON * scale {
        return Err(PortfolioError::DegenerateWeights { sum });
    }

    Ok(raw / sum)
}

/// Stock and bond weights of a fully invested portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioWeights {
    /// Weight on the stock index
    pub stocks: f64,
    /// Weight on the bond index
    pub bonds: f64,
}

impl PortfolioWeights {
    /// Tangency weights from expected returns and a 2×2 covariance matrix.
    ///
    /// # Arguments
    /// * `expected_stocks` - Expected monthly stock excess return
    /// * `expected_bonds` - Expected monthly bond excess return
    /// * `covariance` - Covariance of the two excess returns
    pub fn tangency(
        expected_stocks: f64,
        expected_bonds: f64,
        covariance: &CovarianceMatrix,
    ) -> Result<Self, PortfolioError> {
        let mu = Array1::from(vec![expected_stocks, expected_bonds]);
        let w = tangency_weights(&mu, &covariance.to_array())?;
        let weights = Self {
            stocks: w[0],
            bonds: w[1],
        };
        debug!(
            stocks = weights.stocks,
            bonds = weights.bonds,
            "tangency weights"
        );
        Ok(weights)
    }

    /// Weight of one asset.
    pub const fn get(&self, asset: Asset) -> f64 {
        match asset {
            Asset::Stocks => self.stocks,
            Asset::Bonds => self.bonds,
        }
    }

    /// Sum of the weights.
    pub fn total(&self) -> f64 {
        self.stocks + self.bonds
    }
}

/// Annualized statistics of monthly portfolio excess returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// Monthly mean × 12
    pub mean_return: f64,
    /// Monthly sample standard deviation × √12
    pub volatility: f64,
    /// Annualized mean over annualized volatility
    pub sharpe_ratio: f64,
    /// Months used
    pub observations: usize,
}

impl PortfolioStatistics {
    /// Statistics of a monthly return series.
    pub fn from_returns(returns: &[f64]) -> Result<Self, PortfolioError> {
        let n = returns.len();
        if n < 2 {
            return Err(PortfolioError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let nf = n as f64;
        let mean = returns.iter().sum::<f64>() / nf;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (nf - 1.0);
        let std = variance.sqrt();
        if std == 0.0 || !std.is_finite() {
            return Err(PortfolioError::ZeroVolatility);
        }

        let mean_return = mean * PERIODS_PER_YEAR;
        let volatility = std * PERIODS_PER_YEAR.sqrt();
        Ok(Self {
            mean_return,
            volatility,
            sharpe_ratio: mean_return / volatility,
            observations: n,
        })
    }

    /// Statistics of the weighted excess returns over every panel month.
    ///
    /// Months missing either excess return are skipped, not counted as a zero
    /// return. The first panel month has no excess return, so the mean and
    /// volatility are taken over one observation fewer than a zero-filled
    /// series would have, and differ slightly from zero-filled figures.
    pub fn from_panel(panel: &Panel, weights: &PortfolioWeights) -> Result<Self, PortfolioError> {
        let returns = portfolio_returns(panel, weights)?;
        Self::from_returns(&returns)
    }
}

/// Monthly excess returns of a weighted portfolio, skipping incomplete months.
pub fn portfolio_returns(
    panel: &Panel,
    weights: &PortfolioWeights,
) -> Result<Vec<f64>, PortfolioError> {
    let stocks = panel.excess_returns(Asset::Stocks)?;
    let bonds = panel.excess_returns(Asset::Bonds)?;
    Ok(stocks
        .iter()
        .zip(bonds)
        .filter_map(|(s, b)| Some(weights.stocks * (*s)? + weights.bonds * (*b)?))
        .collect())
}
