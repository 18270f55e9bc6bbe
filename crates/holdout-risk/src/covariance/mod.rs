//! Covariance estimation of monthly excess returns
//!
//! A [`CovarianceEstimator`] turns a block of return observations into a
//! covariance matrix. [`WindowCovariance`] slides that estimator over the panel,
//! recursively or on a rolling window, and keys each matrix by the last month
//! of its window.

pub mod sample;
pub mod utils;
pub mod window;

pub use sample::SampleCovariance;
pub use utils::invert;
pub use window::{
    CovarianceConfig, CovarianceMatrix, CovarianceSeries, CovarianceWindow, WindowCovariance,
};

use holdout_data::{DataError, Month};
use ndarray::Array2;
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// A window holds too few complete rows
    #[error("Covariance window ending {date} has {actual} complete rows, need at least {required}")]
    WindowTooShort {
        /// Last month of the window
        date: Month,
        /// Required number of complete rows
        required: usize,
        /// Complete rows in the window
        actual: usize,
    },

    /// Matrix cannot be inverted
    #[error("Matrix is singular")]
    Singular,

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Panel access failed
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a month and each column is an asset
    ///
    /// # Returns
    /// * Estimated covariance matrix (N x N where N is number of assets)
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>, CovarianceError>;
}
