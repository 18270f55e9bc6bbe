//! Result sets and run report of a pipeline run.
//!
//! Set names and column headers are stable; downstream readers select sets and
//! columns by name. Scenario sets are prefixed with the scenario name, e.g.
//! `rolling.msfe`.

use crate::config::Scenario;
use crate::error::Result;
use crate::pipeline::{AssetForecasts, ModelPortfolio, PipelineResult, ScenarioResult};
use holdout_data::{Asset, AssetStatistics, Panel, columns};
use holdout_forecast::ModelId;
use holdout_output::{Cell, PERFORMANCE_COLUMNS, Report, ReportBuilder, ResultSet, Workbook};
use tracing::debug;

/// Title of the run report.
const REPORT_TITLE: &str = "Holdout out-of-sample forecast evaluation";

/// Every result set of a run: the panel, asset statistics, then each scenario's sets.
pub fn build_workbook(panel: &Panel, result: &PipelineResult) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    workbook.push(panel_set(panel)?)?;
    workbook.push(statistics_set(result)?)?;
    for scenario in &result.scenarios {
        workbook.extend(scenario_sets(scenario)?)?;
    }
    debug!(sets = workbook.len(), "workbook built");
    Ok(workbook)
}

/// Run report: configuration, statistics, every scenario result and the
/// non-fatal failures.
pub fn build_report(result: &PipelineResult) -> Result<Report> {
    let mut builder = ReportBuilder::new()
        .title(REPORT_TITLE)
        .config(&result.config)?
        .result("statistics", &result.statistics)?;
    for scenario in &result.scenarios {
        builder = builder.result(scenario.scenario.name(), scenario)?;
    }
    Ok(builder.failures(result.failures().cloned()).build()?)
}

fn set_name(scenario: Scenario, name: &str) -> String {
    format!("{}.{name}", scenario.name())
}

fn panel_set(panel: &Panel) -> Result<ResultSet> {
    let names: Vec<&str> = panel.column_names().collect();
    let values = names
        .iter()
        .map(|name| panel.column(name))
        .collect::<holdout_data::Result<Vec<_>>>()?;

    let mut set = ResultSet::new(
        "data",
        std::iter::once(columns::DATE).chain(names.iter().copied()),
    );
    for (row, date) in panel.dates().iter().enumerate() {
        let mut cells = Vec::with_capacity(names.len() + 1);
        cells.push(Cell::text(date.to_string()));
        cells.extend(values.iter().map(|column| Cell::from(column[row])));
        set.push_row(cells)?;
    }
    Ok(set)
}

fn statistics_set(result: &PipelineResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(
        "statistics",
        std::iter::once("Statistic").chain(Asset::ALL.iter().map(Asset::index_name)),
    );
    let rows: [(&str, fn(&AssetStatistics) -> f64); 6] = [
        ("Annualized Mean", |s| s.annualized_mean),
        ("Annualized Volatility", |s| s.annualized_volatility),
        ("Sharpe Ratio", |s| s.sharpe_ratio),
        ("Skewness", |s| s.skewness),
        ("Kurtosis", |s| s.kurtosis),
        ("Observations", |s| s.observations as f64),
    ];
    for (label, value) in rows {
        let mut cells = vec![Cell::text(label)];
        cells.extend(
            Asset::ALL
                .iter()
                .map(|&asset| Cell::from(result.statistics.get(asset).map(value))),
        );
        set.push_row(cells)?;
    }
    Ok(set)
}

fn scenario_sets(result: &ScenarioResult) -> Result<Vec<ResultSet>> {
    let scenario = result.scenario;
    let mut sets = vec![mean_forecast_set(result)?];
    for forecasts in &result.forecasts {
        sets.push(model_forecast_set(scenario, forecasts)?);
    }
    sets.push(msfe_set(result)?);
    sets.push(dm_set(result)?);
    sets.push(covariance_set(result)?);
    sets.push(weights_set(result)?);
    sets.push(portfolio_stats_set(result)?);
    sets.push(result.comparison.to_result_set(&set_name(scenario, "comparison"))?);
    Ok(sets)
}

fn mean_forecast_set(result: &ScenarioResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(
        set_name(result.scenario, "mean_forecast"),
        std::iter::once(columns::DATE).chain(Asset::ALL.iter().map(Asset::label)),
    );
    let benchmarks: Vec<_> = Asset::ALL
        .iter()
        .filter_map(|&asset| result.asset(asset).map(|f| &f.benchmark))
        .collect();
    if let Some(first) = benchmarks.first() {
        for date in first.dates() {
            let mut cells = vec![Cell::text(date.to_string())];
            cells.extend(benchmarks.iter().map(|series| Cell::from(series.value_at(*date))));
            set.push_row(cells)?;
        }
    }
    Ok(set)
}

fn model_forecast_set(scenario: Scenario, forecasts: &AssetForecasts) -> Result<ResultSet> {
    let name = format!("forecast.{}", forecasts.asset.label().to_lowercase());
    let headers: Vec<String> = forecasts.models.iter().map(|s| s.model().to_string()).collect();
    let mut set = ResultSet::new(
        set_name(scenario, &name),
        std::iter::once(columns::DATE.to_string()).chain(headers),
    );
    for date in forecasts.benchmark.dates() {
        let mut cells = vec![Cell::text(date.to_string())];
        cells.extend(forecasts.models.iter().map(|series| Cell::from(series.value_at(*date))));
        set.push_row(cells)?;
    }
    Ok(set)
}

fn msfe_set(result: &ScenarioResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(
        set_name(result.scenario, "msfe"),
        ["Asset", "Model", "MSFE", "MSFE Ratio"],
    );
    for record in &result.msfe {
        set.push_row(vec![
            Cell::text(record.asset.label()),
            Cell::text(record.model.to_string()),
            Cell::number(record.msfe),
            Cell::number(record.ratio),
        ])?;
    }
    Ok(set)
}

fn dm_set(result: &ScenarioResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(
        set_name(result.scenario, "dm_test"),
        ["Asset", "Model", "DM Statistic", "p-value", "conclusion"],
    );
    for record in &result.dm_tests {
        set.push_row(vec![
            Cell::text(record.asset.label()),
            Cell::text(record.model.to_string()),
            Cell::number(record.outcome.statistic),
            Cell::number(record.outcome.p_value),
            Cell::text(record.outcome.conclusion.to_string()),
        ])?;
    }
    Ok(set)
}

fn covariance_set(result: &ScenarioResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(
        set_name(result.scenario, "covariance"),
        [
            columns::DATE,
            "Variance - Stocks",
            "Covariance - Stocks/Bonds",
            "Covariance - Bonds/Stocks",
            "Variance - Bonds",
        ],
    );
    for (date, matrix) in result.covariance.iter().flat_map(|series| series.iter()) {
        set.push_row(vec![
            Cell::text(date.to_string()),
            Cell::number(matrix.var_stocks),
            Cell::number(matrix.cov_stocks_bonds),
            Cell::number(matrix.cov_bonds_stocks),
            Cell::number(matrix.var_bonds),
        ])?;
    }
    Ok(set)
}

/// Model portfolios followed by the benchmark portfolio.
fn all_portfolios(result: &ScenarioResult) -> impl Iterator<Item = &ModelPortfolio> {
    result.portfolios.iter().chain(&result.benchmark_portfolio)
}

fn portfolio_label(model: &ModelId) -> String {
    if model.is_benchmark() {
        holdout_output::BENCHMARK_LABEL.to_string()
    } else {
        model.to_string()
    }
}

fn weights_set(result: &ScenarioResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(
        set_name(result.scenario, "weights"),
        std::iter::once("Model").chain(Asset::ALL.iter().map(Asset::label)),
    );
    for portfolio in all_portfolios(result) {
        let mut cells = vec![Cell::text(portfolio_label(&portfolio.model))];
        cells.extend(
            Asset::ALL
                .iter()
                .map(|&asset| Cell::number(portfolio.weights.get(asset))),
        );
        set.push_row(cells)?;
    }
    Ok(set)
}

fn portfolio_stats_set(result: &ScenarioResult) -> Result<ResultSet> {
    let mut set = ResultSet::new(set_name(result.scenario, "portfolio_stats"), PERFORMANCE_COLUMNS);
    for portfolio in all_portfolios(result) {
        set.push_row(vec![
            Cell::text(portfolio_label(&portfolio.model)),
            Cell::number(portfolio.statistics.mean_return),
            Cell::number(portfolio.statistics.volatility),
            Cell::number(portfolio.statistics.sharpe_ratio),
        ])?;
    }
    Ok(set)
}
