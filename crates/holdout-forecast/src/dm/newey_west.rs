//! Newey-West long-run variance of a scalar series.
//!
//! Autocovariances use the biased estimator (divide by `T`, not `T − k`) and are
//! combined with Bartlett kernel weights:
//! ```text
//! γ_k  = (1/T) Σ_{t=k}^{T-1} (d_t − d̄)(d_{t-k} − d̄)
//! w_k  = 1 − k/(L+1)
//! LRV  = 2 · Σ_{k=0}^{L} w_k γ_k / T
//! ```
//! `γ_0` enters the sum with weight `w_0 = 1` and is doubled together with the
//! other terms, so the result is `(γ_0 + 2 Σ_{k≥1} w_k γ_k + γ_0) / T`. This is the
//! variance of the mean used by the Diebold-Mariano statistic below.
//!
//! # References
//! - Newey, W. K., & West, K. D. (1987). "A Simple, Positive Semi-Definite,
//!   Heteroskedasticity and Autocorrelation Consistent Covariance Matrix."
//!   Econometrica, 55(3), 703-708.

use serde::{Deserialize, Serialize};

/// Newey-West configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeweyWestConfig {
    /// Lag truncation `L` (default: 4)
    pub lag: usize,
}

impl Default for NeweyWestConfig {
    fn default() -> Self {
        Self { lag: 4 }
    }
}

/// Newey-West variance of the sample mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeweyWestVariance {
    config: NeweyWestConfig,
}

impl NeweyWestVariance {
    /// Create an estimator with the given configuration
    pub const fn new(config: NeweyWestConfig) -> Self {
        Self { config }
    }

    /// Lag truncation actually used for a series of `n_periods` values.
    ///
    /// Lags at or beyond the series length have no overlapping pairs.
    pub fn effective_lag(&self, n_periods: usize) -> usize {
        self.config.lag.min(n_periods.saturating_sub(1))
    }

    /// Bartlett kernel weight `w_k = 1 − k/(L+1)`.
    ///
    /// # Arguments
    /// * `lag` - The lag index `k`
    /// * `max_lag` - Lag truncation `L`
    pub fn bartlett_weight(lag: usize, max_lag: usize) -> f64 {
        if lag > max_lag {
            0.0
        } else {
            1.0 - (lag as f64) / (max_lag as f64 + 1.0)
        }
    }

    /// Biased autocovariance at `lag` around `mean`.
    pub fn autocovariance(series: &[f64], mean: f64, lag: usize) -> f64 {
        let n = series.len();
        if lag >= n {
            return 0.0;
        }
        let sum: f64 = series[lag..]
            .iter()
            .zip(&series[..n - lag])
            .map(|(a, b)| (a - mean) * (b - mean))
            .sum();
        sum / n as f64
    }

    /// Long-run variance of the mean of `series` around `mean`.
    ///
    /// Weights use the configured lag `L`; autocovariances beyond the series
    /// length are zero.
    pub fn long_run_variance(&self, series: &[f64], mean: f64) -> f64 {
        let n = series.len();
        if n == 0 {
            return 0.0;
        }

        let max_lag = self.config.lag;
        let weighted: f64 = (0..=self.effective_lag(n))
            .map(|k| Self::bartlett_weight(k, max_lag) * Self::autocovariance(series, mean, k))
            .sum();
        2.0 * weighted / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bartlett_weights() {
        assert_relative_eq!(NeweyWestVariance::bartlett_weight(0, 4), 1.0);
        assert_relative_eq!(NeweyWestVariance::bartlett_weight(1, 4), 0.8);
        assert_relative_eq!(NeweyWestVariance::bartlett_weight(4, 4), 0.2);
        assert_relative_eq!(NeweyWestVariance::bartlett_weight(5, 4), 0.0);
    }

    #[test]
    fn test_autocovariance_divides_by_t() {
        let d = [1.0, -1.0, 1.0, -1.0];
        // Mean 0: γ_0 = 4/4, γ_1 = −3/4, γ_2 = 2/4
        assert_relative_eq!(NeweyWestVariance::autocovariance(&d, 0.0, 0), 1.0);
        assert_relative_eq!(NeweyWestVariance::autocovariance(&d, 0.0, 1), -0.75);
        assert_relative_eq!(NeweyWestVariance::autocovariance(&d, 0.0, 2), 0.5);
        assert_relative_eq!(NeweyWestVariance::autocovariance(&d, 0.0, 9), 0.0);
    }

    #[test]
    fn test_long_run_variance_formula() {
        let d = [1.0, -1.0, 1.0, -1.0];
        let nw = NeweyWestVariance::new(NeweyWestConfig { lag: 2 });
        // 2·(1·1 + (2/3)·(−0.75) + (1/3)·0.5) / 4
        let expected = 2.0 * (1.0 - 0.5 + 0.5 / 3.0) / 4.0;
        assert_relative_eq!(nw.long_run_variance(&d, 0.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_lag_clamped_to_series_length() {
        let d = [0.5, -0.25];
        let nw = NeweyWestVariance::new(NeweyWestConfig { lag: 4 });
        assert_eq!(nw.effective_lag(2), 1);
        assert_eq!(nw.effective_lag(0), 0);

        let mean = 0.125;
        let g0 = NeweyWestVariance::autocovariance(&d, mean, 0);
        let g1 = NeweyWestVariance::autocovariance(&d, mean, 1);
        let expected = 2.0 * (g0 + 0.8 * g1) / 2.0;
        assert_relative_eq!(nw.long_run_variance(&d, mean), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_constant_series_has_zero_variance() {
        let nw = NeweyWestVariance::default();
        assert_eq!(nw.long_run_variance(&[0.0; 10], 0.0), 0.0);
        assert_eq!(nw.long_run_variance(&[], 0.0), 0.0);
    }
}
