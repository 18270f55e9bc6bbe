#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/holdout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod workbook;

// Re-export main types from sub-crates
pub use holdout_data as data;
pub use holdout_forecast as forecast;
pub use holdout_output as output;
pub use holdout_risk as risk;

pub use config::{PipelineConfig, Scenario};
pub use error::{PipelineError, Result};
pub use pipeline::{
    AssetForecasts, ModelPortfolio, PipelineResult, ScenarioResult, run_pipeline, run_scenario,
};
pub use workbook::{build_report, build_workbook};

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
