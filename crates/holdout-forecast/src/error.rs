//! Error types for forecasting and evaluation.

use crate::series::ModelId;
use holdout_data::{Asset, DataError, Month};
use thiserror::Error;

/// Result type for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while producing or evaluating forecasts.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Estimation window has too few usable observations
    #[error(
        "Insufficient data for {model} ({asset}) at {date}: need at least {required} observations, got {actual}"
    )]
    InsufficientData {
        /// Model being estimated
        model: ModelId,
        /// Asset being forecast
        asset: Asset,
        /// Target month of the forecast
        date: Month,
        /// Required number of observations
        required: usize,
        /// Usable observations in the window
        actual: usize,
    },

    /// Regressors have no variation, or the normal equations are not positive definite
    #[error("Singular design for {model} ({asset}) at {date}")]
    SingularDesign {
        /// Model being estimated
        model: ModelId,
        /// Asset being forecast
        asset: Asset,
        /// Target month of the forecast
        date: Month,
    },

    /// A value needed for a forecast or its evaluation is missing
    #[error("Missing value of '{column}' at {date}")]
    MissingValue {
        /// Panel column
        column: String,
        /// Month of the missing value
        date: Month,
    },

    /// Series do not cover the same months
    #[error("Misaligned series for {model} ({asset}): {reason}")]
    Misaligned {
        /// Model whose series is misaligned
        model: ModelId,
        /// Asset being forecast
        asset: Asset,
        /// Description of the mismatch
        reason: String,
    },

    /// Benchmark MSFE of zero makes every ratio undefined
    #[error("Benchmark MSFE for {asset} is zero; MSFE ratios are undefined")]
    ZeroBenchmarkMsfe {
        /// Asset whose benchmark is perfect
        asset: Asset,
    },

    /// Loss differential has a non-zero mean but zero long-run variance
    #[error("Degenerate loss differential: mean {mean} with long-run variance {variance}")]
    DegenerateVariance {
        /// Mean loss differential
        mean: f64,
        /// Long-run variance estimate
        variance: f64,
    },

    /// Input slices differ in length
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid estimator parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Nothing to compute over
    #[error("Empty input: {0}")]
    Empty(String),

    /// Panel error
    #[error(transparent)]
    Data(#[from] DataError),
}
