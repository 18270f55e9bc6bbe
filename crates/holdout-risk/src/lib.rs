#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/holdout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod portfolio;

// Re-export main types
pub use covariance::{
    CovarianceConfig, CovarianceError, CovarianceEstimator, CovarianceMatrix, CovarianceSeries,
    CovarianceWindow, SampleCovariance, WindowCovariance,
};
pub use portfolio::{
    PortfolioError, PortfolioStatistics, PortfolioWeights, portfolio_returns, tangency_weights,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
