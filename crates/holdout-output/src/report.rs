//! Run report.
//!
//! `report.json` holds the configuration a run used, every result it produced
//! and the stages that failed without stopping the run. It carries no clock
//! time, so identical inputs give an identical report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the run report.
pub const REPORT_FILE: &str = "report.json";

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field was never set.
    #[error("Report is missing its {0}")]
    MissingField(&'static str),
}

/// A stage that failed without aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageFailure {
    /// Scenario the stage ran in.
    pub scenario: String,

    /// Stage name.
    pub stage: String,

    /// Model the stage was working on, if any.
    pub model: Option<String>,

    /// Error message.
    pub message: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scenario, self.stage)?;
        if let Some(model) = &self.model {
            write!(f, " ({model})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Report of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    /// Report title.
    pub title: String,

    /// Version of the software that produced the report.
    pub version: String,

    /// Configuration the run used.
    pub config: serde_json::Value,

    /// Results keyed by scenario or stage.
    pub results: serde_json::Value,

    /// Stages that failed without aborting the run.
    pub failures: Vec<StageFailure>,
}

impl Report {
    /// Create a new report.
    pub fn new(title: String, config: serde_json::Value, results: serde_json::Value) -> Self {
        Self {
            title,
            version: crate::VERSION.to_string(),
            config,
            results,
            failures: Vec::new(),
        }
    }

    /// True when every stage succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as [`REPORT_FILE`] inside `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<std::path::PathBuf, ReportError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    config: Option<serde_json::Value>,
    results: serde_json::Map<String, serde_json::Value>,
    failures: Vec<StageFailure>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the run configuration.
    pub fn config<T: Serialize>(mut self, config: &T) -> Result<Self, ReportError> {
        self.config = Some(serde_json::to_value(config)?);
        Ok(self)
    }

    /// Add a named result.
    pub fn result<T: Serialize>(mut self, key: impl Into<String>, value: &T) -> Result<Self, ReportError> {
        self.results.insert(key.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Record non-fatal stage failures.
    pub fn failures(mut self, failures: impl IntoIterator<Item = StageFailure>) -> Self {
        self.failures.extend(failures);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let title = self.title.ok_or(ReportError::MissingField("title"))?;
        let config = self.config.ok_or(ReportError::MissingField("configuration"))?;
        let mut report = Report::new(title, config, serde_json::Value::Object(self.results));
        report.failures = self.failures;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> StageFailure {
        StageFailure {
            scenario: "rolling".to_string(),
            stage: "portfolio".to_string(),
            model: Some("Lasso".to_string()),
            message: "Covariance matrix is singular".to_string(),
        }
    }

    #[test]
    fn test_report_builder() {
        let report = ReportBuilder::new()
            .title("holdout run")
            .config(&serde_json::json!({"rolling_window": 12}))
            .unwrap()
            .result("recursive", &serde_json::json!({"msfe": [1.0]}))
            .unwrap()
            .failures([failure()])
            .build()
            .unwrap();

        assert_eq!(report.title, "holdout run");
        assert_eq!(report.config["rolling_window"], 12);
        assert_eq!(report.results["recursive"]["msfe"][0], 1.0);
        assert!(!report.is_clean());
        assert_eq!(report.version, crate::VERSION);
    }

    #[test]
    fn test_builder_requires_config() {
        let err = ReportBuilder::new().title("x").build().unwrap_err();
        assert!(matches!(err, ReportError::MissingField("configuration")));
    }

    #[test]
    fn test_report_is_deterministic() {
        let build = || {
            ReportBuilder::new()
                .title("holdout run")
                .config(&serde_json::json!({"lag": 4}))
                .unwrap()
                .build()
                .unwrap()
                .to_json()
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(
            failure().to_string(),
            "[rolling] portfolio (Lasso): Covariance matrix is singular"
        );
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new(
            "t".to_string(),
            serde_json::Value::Null,
            serde_json::json!({}),
        );
        let path = report.write_to_dir(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(REPORT_FILE));
        let back: Report = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
