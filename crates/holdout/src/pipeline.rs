//! Scenario orchestration.
//!
//! A run takes the merged panel and a [`PipelineConfig`] and produces, per
//! scenario, forecasts for both assets, their evaluation against the mean
//! benchmark, a covariance series and the tangency portfolios built from them.
//!
//! Forecasting and MSFE evaluation are required: their failure aborts the run.
//! A failing Diebold-Mariano test, covariance series or portfolio is recorded as
//! a [`StageFailure`] and the run continues with the stages that do not need it.

use crate::config::{PipelineConfig, Scenario};
use crate::error::{PipelineError, Result};
use holdout_data::{Asset, AssetSummary, Panel};
use holdout_forecast::{
    DmRecord, ForecastSeries, ModelId, MsfeRecord, PenalizedForecaster, Penalty, RecursiveOls,
    SampleSplit, combine, evaluate_msfe,
};
use holdout_output::{ComparativeAnalysis, PerformanceRow, StageFailure};
use holdout_risk::{
    CovarianceMatrix, CovarianceSeries, PortfolioError, PortfolioStatistics, PortfolioWeights,
    WindowCovariance,
};
use serde::Serialize;
use tracing::{info, warn};

const FORECAST: &str = "forecast";
const MSFE: &str = "msfe";
const DM_TEST: &str = "dm_test";
const COVARIANCE: &str = "covariance";
const PORTFOLIO: &str = "portfolio";

/// Benchmark and model forecasts of one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetForecasts {
    /// Forecast asset
    pub asset: Asset,
    /// Mean forecast the models are judged against
    pub benchmark: ForecastSeries,
    /// One OLS series per predictor, then the combined, Lasso and Ridge series.
    /// Model series may skip months where a predictor they use is missing.
    pub models: Vec<ForecastSeries>,
}

impl AssetForecasts {
    /// Series of one model; [`ModelId::Mean`] gives the benchmark.
    pub fn get(&self, model: &ModelId) -> Option<&ForecastSeries> {
        if model.is_benchmark() {
            return Some(&self.benchmark);
        }
        self.models.iter().find(|series| series.model() == model)
    }
}

/// Tangency portfolio built from one model's latest forecasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPortfolio {
    /// Model whose forecasts set the expected returns
    pub model: ModelId,
    /// Normalized weights
    pub weights: PortfolioWeights,
    /// Annualized statistics over the full panel
    pub statistics: PortfolioStatistics,
}

impl ModelPortfolio {
    fn performance(&self) -> PerformanceRow {
        PerformanceRow::new(
            self.model.to_string(),
            self.statistics.mean_return,
            self.statistics.volatility,
            self.statistics.sharpe_ratio,
        )
    }
}

/// Everything one scenario produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: Scenario,
    /// Forecasts per asset, stocks first
    pub forecasts: Vec<AssetForecasts>,
    /// MSFE records per asset, each asset's benchmark record first
    pub msfe: Vec<MsfeRecord>,
    /// Diebold-Mariano tests of every model against its asset's benchmark
    pub dm_tests: Vec<DmRecord>,
    /// Covariance series, absent when it could not be estimated
    pub covariance: Option<CovarianceSeries>,
    /// Model portfolios that could be built
    pub portfolios: Vec<ModelPortfolio>,
    /// Portfolio built from the benchmark forecasts
    pub benchmark_portfolio: Option<ModelPortfolio>,
    /// Model portfolios compared with the benchmark portfolio
    pub comparison: ComparativeAnalysis,
    /// Stages that failed without stopping the scenario
    pub failures: Vec<StageFailure>,
}

impl ScenarioResult {
    /// Forecasts of one asset.
    pub fn asset(&self, asset: Asset) -> Option<&AssetForecasts> {
        self.forecasts.iter().find(|f| f.asset == asset)
    }

    /// True when no stage failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Descriptive statistics of both excess returns
    pub statistics: AssetSummary,
    /// One result per configured scenario, in configuration order
    pub scenarios: Vec<ScenarioResult>,
}

impl PipelineResult {
    /// Result of one scenario.
    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioResult> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }

    /// Non-fatal failures across all scenarios.
    pub fn failures(&self) -> impl Iterator<Item = &StageFailure> {
        self.scenarios.iter().flat_map(|s| &s.failures)
    }
}

/// Run every configured scenario over `panel`.
///
/// # Arguments
/// * `panel` - Merged monthly panel
/// * `config` - Validated before anything runs
///
/// # Returns
/// * Statistics and one [`ScenarioResult`] per scenario
pub fn run_pipeline(panel: &Panel, config: &PipelineConfig) -> Result<PipelineResult> {
    config.validate()?;
    info!(
        rows = panel.len(),
        first = ?panel.first_month(),
        last = ?panel.last_month(),
        scenarios = config.scenarios.len(),
        "starting pipeline"
    );

    let statistics = AssetSummary::from_panel(panel)?;
    info!("asset statistics computed");

    let scenarios = config
        .scenarios
        .iter()
        .map(|&scenario| run_scenario(panel, config, scenario))
        .collect::<Result<Vec<_>>>()?;

    Ok(PipelineResult {
        config: config.clone(),
        statistics,
        scenarios,
    })
}

/// Run one scenario over `panel`.
pub fn run_scenario(
    panel: &Panel,
    config: &PipelineConfig,
    scenario: Scenario,
) -> Result<ScenarioResult> {
    let split = config.split()?;
    let mut failures = Vec::new();

    let forecasts = Asset::ALL
        .into_iter()
        .map(|asset| forecast_asset(panel, config, scenario, asset, &split))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.in_stage(scenario, FORECAST))?;
    info!(
        %scenario,
        series = forecasts.iter().map(|f| f.models.len() + 1).sum::<usize>(),
        "forecasts complete"
    );

    let mut msfe = Vec::new();
    for asset_forecasts in &forecasts {
        let records = evaluate_msfe(panel, &asset_forecasts.benchmark, &asset_forecasts.models)
            .map_err(|e| PipelineError::from(e).in_stage(scenario, MSFE))?;
        msfe.extend(records);
    }
    info!(%scenario, records = msfe.len(), "MSFE evaluated");

    let dm = config.diebold_mariano();
    let mut dm_tests = Vec::new();
    for asset_forecasts in &forecasts {
        for model in &asset_forecasts.models {
            match dm.test_series(panel, model, &asset_forecasts.benchmark) {
                Ok(record) => dm_tests.push(record),
                Err(e) => {
                    warn!(
                        %scenario,
                        asset = %asset_forecasts.asset,
                        model = %model.model(),
                        error = %e,
                        "Diebold-Mariano test failed"
                    );
                    failures.push(failure(scenario, DM_TEST, Some(model.model()), &e));
                }
            }
        }
    }
    info!(%scenario, tests = dm_tests.len(), "Diebold-Mariano tests complete");

    let covariance = match WindowCovariance::new(config.covariance_config(scenario)).estimate(panel)
    {
        Ok(series) => {
            info!(%scenario, matrices = series.len(), "covariance series estimated");
            Some(series)
        }
        Err(e) => {
            warn!(%scenario, error = %e, "covariance estimation failed, skipping portfolios");
            failures.push(failure(scenario, COVARIANCE, None, &e));
            None
        }
    };

    let mut portfolios = Vec::new();
    let mut benchmark_portfolio = None;
    if let Some((date, matrix)) = covariance.as_ref().and_then(CovarianceSeries::last) {
        info!(%scenario, covariance_date = %date, "building tangency portfolios");
        for model in portfolio_models(&forecasts) {
            match build_portfolio(panel, &forecasts, &model, matrix) {
                Ok(portfolio) if model.is_benchmark() => benchmark_portfolio = Some(portfolio),
                Ok(portfolio) => portfolios.push(portfolio),
                Err(e) => {
                    warn!(%scenario, model = %model, error = %e, "portfolio construction failed");
                    failures.push(failure(scenario, PORTFOLIO, Some(&model), &e));
                }
            }
        }
    }

    let comparison = ComparativeAnalysis::new(
        portfolios.iter().map(ModelPortfolio::performance).collect(),
        benchmark_portfolio.as_ref().map(ModelPortfolio::performance),
    );
    info!(
        %scenario,
        portfolios = portfolios.len(),
        failures = failures.len(),
        "scenario complete"
    );

    Ok(ScenarioResult {
        scenario,
        forecasts,
        msfe,
        dm_tests,
        covariance,
        portfolios,
        benchmark_portfolio,
        comparison,
        failures,
    })
}

/// Benchmark and model forecasts of one asset.
///
/// A missing predictor value only removes the affected months from the models
/// that need it; an absent predictor column fails the stage.
fn forecast_asset(
    panel: &Panel,
    config: &PipelineConfig,
    scenario: Scenario,
    asset: Asset,
    split: &SampleSplit,
) -> Result<AssetForecasts> {
    let benchmark = scenario.mean_estimator(config)?.forecast(panel, asset, split)?;

    let mut models = RecursiveOls::new(config.predictors.clone()).forecast(panel, asset, split)?;
    models.push(combine(&models)?);

    let penalized = PenalizedForecaster::new(config.predictors.clone(), config.penalized_config());
    for penalty in Penalty::ALL {
        models.push(penalized.forecast(panel, asset, split, penalty)?);
    }

    Ok(AssetForecasts {
        asset,
        benchmark,
        models,
    })
}

/// Models that get a portfolio, in reporting order, followed by the benchmark.
fn portfolio_models(forecasts: &[AssetForecasts]) -> Vec<ModelId> {
    let mut models: Vec<ModelId> = forecasts
        .first()
        .map(|f| f.models.iter().map(|s| s.model().clone()).collect())
        .unwrap_or_default();
    models.push(ModelId::Mean);
    models
}

/// Tangency portfolio from a model's stock and bond forecasts for the final
/// out-of-sample month.
///
/// A model that skipped that month has no portfolio.
fn build_portfolio(
    panel: &Panel,
    forecasts: &[AssetForecasts],
    model: &ModelId,
    covariance: &CovarianceMatrix,
) -> std::result::Result<ModelPortfolio, PortfolioError> {
    let latest = |asset: Asset| {
        forecasts
            .iter()
            .find(|f| f.asset == asset)
            .and_then(|f| {
                let (date, _) = f.benchmark.last()?;
                f.get(model)?.value_at(date)
            })
            .ok_or_else(|| {
                PortfolioError::DimensionMismatch(format!(
                    "no final-month {asset} forecast for {model}"
                ))
            })
    };

    let weights =
        PortfolioWeights::tangency(latest(Asset::Stocks)?, latest(Asset::Bonds)?, covariance)?;
    let statistics = PortfolioStatistics::from_panel(panel, &weights)?;
    Ok(ModelPortfolio {
        model: model.clone(),
        weights,
        statistics,
    })
}

fn failure(
    scenario: Scenario,
    stage: &str,
    model: Option<&ModelId>,
    error: &dyn std::error::Error,
) -> StageFailure {
    StageFailure {
        scenario: scenario.to_string(),
        stage: stage.to_string(),
        model: model.map(ToString::to_string),
        message: error.to_string(),
    }
}
