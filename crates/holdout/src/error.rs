//! Pipeline errors.

use crate::config::Scenario;
use holdout_data::DataError;
use holdout_forecast::ForecastError;
use holdout_output::{ExportError, ReportError};
use holdout_risk::{CovarianceError, PortfolioError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Cannot read configuration {path}: {source}")]
    ConfigFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("Cannot parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A stage failed inside a scenario
    #[error("{scenario} scenario, {stage} stage: {source}")]
    Stage {
        /// Scenario being run
        scenario: Scenario,
        /// Stage name
        stage: &'static str,
        /// Underlying error
        source: Box<Self>,
    },

    /// Panel error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Forecasting or evaluation error
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Covariance estimation error
    #[error(transparent)]
    Covariance(#[from] CovarianceError),

    /// Portfolio construction error
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Result export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Report error
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl PipelineError {
    /// Attach the scenario and stage an error came from.
    pub fn in_stage(self, scenario: Scenario, stage: &'static str) -> Self {
        Self::Stage {
            scenario,
            stage,
            source: Box::new(self),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
