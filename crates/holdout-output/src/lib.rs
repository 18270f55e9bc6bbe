#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/holdout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;
pub mod table;

pub use export::{ExportError, ExportFormat, Exporter, WORKBOOK_JSON, Workbook};
pub use report::{REPORT_FILE, Report, ReportBuilder, ReportError, StageFailure};
pub use summary::{BENCHMARK_LABEL, ComparativeAnalysis, PERFORMANCE_COLUMNS, PerformanceRow};
pub use table::{Cell, ResultSet};

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
