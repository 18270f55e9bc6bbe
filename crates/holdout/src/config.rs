//! Pipeline configuration.
//!
//! [`PipelineConfig`] names every tunable of a run. All fields have defaults,
//! so a TOML file only needs the keys it changes:
//!
//! ```toml
//! in_sample_start = "1980-01"
//! out_sample_end = "last"
//! rolling_window = 24
//! scenarios = ["rolling"]
//! ```

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use holdout_data::Month;
use holdout_data::columns::DEFAULT_PREDICTORS;
use holdout_forecast::{DieboldMariano, MeanEstimator, PenalizedConfig, SampleSplit};
use holdout_risk::{CovarianceConfig, CovarianceWindow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Benchmark and covariance scheme of one pipeline pass.
///
/// Predictive OLS regressions are recursive in both scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Expanding-window mean benchmark, recursive covariance
    Recursive,
    /// Rolling-window mean benchmark, rolling covariance
    Rolling,
}

impl Scenario {
    /// Both scenarios in run order.
    pub const ALL: [Self; 2] = [Self::Recursive, Self::Rolling];

    /// Lowercase name, used as the result-set prefix.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Rolling => "rolling",
        }
    }

    /// Benchmark mean estimator.
    pub fn mean_estimator(&self, config: &PipelineConfig) -> Result<MeanEstimator> {
        match self {
            Self::Recursive => Ok(MeanEstimator::expanding()),
            Self::Rolling => Ok(MeanEstimator::rolling(config.rolling_window)?),
        }
    }

    /// Covariance window scheme.
    pub const fn covariance_window(&self) -> CovarianceWindow {
        match self {
            Self::Recursive => CovarianceWindow::Recursive,
            Self::Rolling => CovarianceWindow::Rolling,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" | "expanding" => Ok(Self::Recursive),
            "rolling" => Ok(Self::Rolling),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown scenario '{other}' (expected recursive or rolling)"
            ))),
        }
    }
}

/// Configuration of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// First in-sample month (default: 1980-01)
    pub in_sample_start: Month,
    /// Last in-sample month (default: 1999-12)
    pub in_sample_end: Month,
    /// First forecast month (default: 2000-01)
    pub out_sample_start: Month,
    /// Last forecast month (default: 2021-12); `"last"` in TOML means the last panel month
    #[serde(with = "last_month")]
    pub out_sample_end: Option<Month>,
    /// Rolling benchmark window in months (default: 12)
    pub rolling_window: usize,
    /// Newey-West lag truncation of the DM test (default: 4)
    pub newey_west_lag: usize,
    /// Lasso/Ridge regularization strength (default: 0.1)
    pub penalty_alpha: f64,
    /// Lasso coordinate-descent sweeps (default: 1000)
    pub lasso_max_iter: usize,
    /// Lasso convergence tolerance (default: 1e-4)
    pub lasso_tolerance: f64,
    /// Initial covariance window, also the rolling covariance length (default: 242)
    pub covariance_window: usize,
    /// Predictor columns (default: E12, b/m, tbl, ntis, infl)
    pub predictors: Vec<String>,
    /// Scenarios to run (default: recursive, rolling)
    pub scenarios: Vec<Scenario>,
}

/// Month for built-in defaults; the arguments are always a valid month.
fn default_month(year: i32, month: u32) -> Month {
    Month::new(year, month).unwrap_or_else(|| Month::from_date(NaiveDate::MIN))
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            in_sample_start: default_month(1980, 1),
            in_sample_end: default_month(1999, 12),
            out_sample_start: default_month(2000, 1),
            out_sample_end: Some(default_month(2021, 12)),
            rolling_window: 12,
            newey_west_lag: 4,
            penalty_alpha: 0.1,
            lasso_max_iter: 1000,
            lasso_tolerance: 1e-4,
            covariance_window: 242,
            predictors: DEFAULT_PREDICTORS.iter().map(|p| p.to_string()).collect(),
            scenarios: Scenario::ALL.to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(PipelineError::InvalidConfig(message));

        self.split()?;
        if self.rolling_window == 0 {
            return invalid("rolling window must be at least 1 month".to_string());
        }
        if self.covariance_window < 2 {
            return invalid(format!(
                "covariance window must be at least 2 months, got {}",
                self.covariance_window
            ));
        }
        self.penalized_config()
            .validate()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        if self.predictors.is_empty() {
            return invalid("at least one predictor is required".to_string());
        }
        if let Some(duplicate) = self
            .predictors
            .iter()
            .enumerate()
            .find_map(|(i, p)| self.predictors[..i].contains(p).then_some(p))
        {
            return invalid(format!("predictor '{duplicate}' is listed twice"));
        }
        if self.scenarios.is_empty() {
            return invalid("at least one scenario is required".to_string());
        }
        Ok(())
    }

    /// In-sample and out-of-sample periods.
    pub fn split(&self) -> Result<SampleSplit> {
        SampleSplit::new(
            self.in_sample_start,
            self.in_sample_end,
            self.out_sample_start,
            self.out_sample_end,
        )
        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    /// Lasso/Ridge settings.
    pub const fn penalized_config(&self) -> PenalizedConfig {
        PenalizedConfig {
            alpha: self.penalty_alpha,
            max_iter: self.lasso_max_iter,
            tolerance: self.lasso_tolerance,
        }
    }

    /// Covariance settings of a scenario.
    pub const fn covariance_config(&self, scenario: Scenario) -> CovarianceConfig {
        CovarianceConfig {
            initial_window: self.covariance_window,
            window: scenario.covariance_window(),
        }
    }

    /// Diebold-Mariano tester.
    pub const fn diebold_mariano(&self) -> DieboldMariano {
        DieboldMariano::new(self.newey_west_lag)
    }
}

/// `Option<Month>` where `None` is spelled `"last"`.
mod last_month {
    use holdout_data::Month;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const LAST: &str = "last";

    pub(super) fn serialize<S: Serializer>(
        value: &Option<Month>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(month) => serializer.collect_str(month),
            None => serializer.serialize_str(LAST),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Month>, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.trim().eq_ignore_ascii_case(LAST) {
            return Ok(None);
        }
        text.parse().map(Some).map_err(D::Error::custom)
    }
}
