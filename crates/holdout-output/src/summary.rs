//! Comparative performance of model portfolios.
//!
//! Each predictive model's tangency portfolio is summarized by its annualized
//! mean return, volatility and Sharpe ratio, and compared against the
//! portfolio built from the benchmark mean forecast.

use crate::export::ExportError;
use crate::table::{Cell, ResultSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row label of the benchmark portfolio.
pub const BENCHMARK_LABEL: &str = "Benchmark";

/// Column headers of performance tables.
pub const PERFORMANCE_COLUMNS: [&str; 4] = ["Model", "Mean Return", "Volatility", "Sharpe Ratio"];

/// Annualized performance of one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceRow {
    /// Model the portfolio was built from.
    pub model: String,

    /// Annualized mean excess return.
    pub mean_return: f64,

    /// Annualized volatility.
    pub volatility: f64,

    /// Sharpe ratio.
    pub sharpe_ratio: f64,
}

impl PerformanceRow {
    /// Create a new performance row.
    pub fn new(model: impl Into<String>, mean_return: f64, volatility: f64, sharpe_ratio: f64) -> Self {
        Self {
            model: model.into(),
            mean_return,
            volatility,
            sharpe_ratio,
        }
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(self.model.clone()),
            Cell::number(self.mean_return),
            Cell::number(self.volatility),
            Cell::number(self.sharpe_ratio),
        ]
    }
}

impl fmt::Display for PerformanceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: mean {:.2}%, volatility {:.2}%, Sharpe {:.3}",
            self.model,
            self.mean_return * 100.0,
            self.volatility * 100.0,
            self.sharpe_ratio
        )
    }
}

/// Model portfolios compared against the benchmark portfolio.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComparativeAnalysis {
    /// Model portfolios in reporting order.
    pub models: Vec<PerformanceRow>,

    /// Benchmark portfolio, reported last.
    pub benchmark: Option<PerformanceRow>,
}

impl ComparativeAnalysis {
    /// Create a comparison; the benchmark row is relabelled [`BENCHMARK_LABEL`].
    pub fn new(models: Vec<PerformanceRow>, benchmark: Option<PerformanceRow>) -> Self {
        let benchmark = benchmark.map(|row| PerformanceRow {
            model: BENCHMARK_LABEL.to_string(),
            ..row
        });
        Self { models, benchmark }
    }

    /// Model rows followed by the benchmark row.
    pub fn rows(&self) -> impl Iterator<Item = &PerformanceRow> {
        self.models.iter().chain(self.benchmark.as_ref())
    }

    /// Model with the highest Sharpe ratio.
    pub fn best_sharpe(&self) -> Option<&PerformanceRow> {
        self.models
            .iter()
            .filter(|row| row.sharpe_ratio.is_finite())
            .max_by(|a, b| a.sharpe_ratio.total_cmp(&b.sharpe_ratio))
    }

    /// Models whose Sharpe ratio beats the benchmark's.
    pub fn outperformers(&self) -> Vec<&PerformanceRow> {
        match &self.benchmark {
            Some(benchmark) => self
                .models
                .iter()
                .filter(|row| row.sharpe_ratio > benchmark.sharpe_ratio)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Table of every row, named `name`.
    pub fn to_result_set(&self, name: &str) -> Result<ResultSet, ExportError> {
        let mut set = ResultSet::new(name, PERFORMANCE_COLUMNS);
        for row in self.rows() {
            set.push_row(row.cells())?;
        }
        Ok(set)
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nPortfolio Comparison\n");
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>12} {:>12} {:>12}\n",
            "Model", "Mean Return", "Volatility", "Sharpe Ratio"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for (i, row) in self.rows().enumerate() {
            if i == self.models.len() {
                output.push_str(&"-".repeat(64));
                output.push('\n');
            }
            output.push_str(&format!(
                "{:<24} {:>11.2}% {:>11.2}% {:>12.4}\n",
                row.model,
                row.mean_return * 100.0,
                row.volatility * 100.0,
                row.sharpe_ratio
            ));
        }

        output.push_str(&"=".repeat(64));
        output.push('\n');
        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("## Portfolio Comparison\n\n");
        output.push_str("| Model | Mean Return | Volatility | Sharpe Ratio |\n");
        output.push_str("|-------|-------------|------------|--------------|\n");
        for row in self.rows() {
            output.push_str(&format!(
                "| {} | {:.2}% | {:.2}% | {:.4} |\n",
                row.model,
                row.mean_return * 100.0,
                row.volatility * 100.0,
                row.sharpe_ratio
            ));
        }

        if let Some(best) = self.best_sharpe() {
            output.push_str(&format!(
                "\n**Highest Sharpe ratio:** {} ({:.4})\n",
                best.model, best.sharpe_ratio
            ));
        }
        output
    }
}

impl fmt::Display for ComparativeAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> ComparativeAnalysis {
        ComparativeAnalysis::new(
            vec![
                PerformanceRow::new("Forecast_tbl", 0.08, 0.16, 0.5),
                PerformanceRow::new("Combined_Forecast", 0.09, 0.12, 0.75),
                PerformanceRow::new("Lasso", 0.05, 0.20, 0.25),
            ],
            Some(PerformanceRow::new("Mean_Forecast", 0.06, 0.15, 0.4)),
        )
    }

    #[test]
    fn test_benchmark_row_is_last_and_relabelled() {
        let analysis = analysis();
        let labels: Vec<&str> = analysis.rows().map(|r| r.model.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Forecast_tbl", "Combined_Forecast", "Lasso", "Benchmark"]
        );
    }

    #[test]
    fn test_best_and_outperformers() {
        let analysis = analysis();
        assert_eq!(analysis.best_sharpe().unwrap().model, "Combined_Forecast");
        let beats: Vec<&str> = analysis
            .outperformers()
            .iter()
            .map(|r| r.model.as_str())
            .collect();
        assert_eq!(beats, vec!["Forecast_tbl", "Combined_Forecast"]);
        assert!(ComparativeAnalysis::default().outperformers().is_empty());
    }

    #[test]
    fn test_result_set_columns() {
        let set = analysis().to_result_set("recursive.comparison").unwrap();
        assert_eq!(set.name(), "recursive.comparison");
        assert_eq!(set.columns(), PERFORMANCE_COLUMNS.map(String::from).as_slice());
        assert_eq!(set.len(), 4);
        assert_eq!(set.rows()[3][0], Cell::text(BENCHMARK_LABEL));
        assert_eq!(set.rows()[1][3], Cell::number(0.75));
    }

    #[test]
    fn test_ascii_and_markdown() {
        let ascii = analysis().to_ascii_table();
        assert!(ascii.contains("Portfolio Comparison"));
        assert!(ascii.contains("Benchmark"));
        assert!(ascii.contains("9.00%"));

        let markdown = analysis().to_markdown();
        assert!(markdown.contains("| Model | Mean Return |"));
        assert!(markdown.contains("**Highest Sharpe ratio:** Combined_Forecast"));
    }
}
