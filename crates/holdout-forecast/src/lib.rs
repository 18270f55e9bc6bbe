#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/holdout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dm;
pub mod error;
pub mod evaluate;
pub mod mean;
pub mod ols;
pub mod penalized;
pub mod series;
pub mod window;

pub use dm::{DieboldMariano, DmConclusion, DmOutcome, DmRecord, REJECTION_THRESHOLD};
pub use error::{ForecastError, Result};
pub use evaluate::{MsfeRecord, align_actuals, evaluate_msfe, msfe};
pub use mean::MeanEstimator;
pub use ols::{RecursiveOls, SimpleRegression, combine};
pub use penalized::{
    LassoRegression, LinearFit, PenalizedConfig, PenalizedForecaster, Penalty, RidgeRegression,
};
pub use series::{ForecastSeries, ModelId};
pub use window::{SampleSplit, Window};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
