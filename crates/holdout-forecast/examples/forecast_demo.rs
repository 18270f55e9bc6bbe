//! Demonstration of holdout-forecast
//!
//! Builds a deterministic monthly panel, then:
//! - produces recursive and rolling mean benchmark forecasts
//! - re-fits univariate OLS regressions every month and combines them
//! - fits Lasso and Ridge once on the in-sample period
//! - evaluates MSFE ratios and Diebold-Mariano tests against the benchmark

use holdout_data::{Asset, Month, Panel, columns};
use holdout_forecast::{
    DieboldMariano, MeanEstimator, PenalizedConfig, PenalizedForecaster, Penalty, RecursiveOls,
    SampleSplit, combine, evaluate_msfe,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("==========================================================");
    println!("          Holdout Forecasting - Demo");
    println!("==========================================================\n");

    let panel = demo_panel(120)?;
    let split = SampleSplit::new(
        month(1990, 1)?,
        month(1994, 12)?,
        month(1995, 1)?,
        None,
    )?;
    let predictors = vec!["dp".to_string(), "tbl".to_string()];

    for (label, benchmark_estimator) in [
        ("Recursive", MeanEstimator::expanding()),
        ("Rolling (12m)", MeanEstimator::rolling(12)?),
    ] {
        println!("----------------------------------------------------------");
        println!("{label} benchmark");
        println!("----------------------------------------------------------");

        let benchmark = benchmark_estimator.forecast(&panel, Asset::Stocks, &split)?;
        let mut models = RecursiveOls::new(predictors.clone()).forecast(&panel, Asset::Stocks, &split)?;
        models.push(combine(&models)?);
        let penalized = PenalizedForecaster::new(predictors.clone(), PenalizedConfig::default());
        for penalty in Penalty::ALL {
            models.push(penalized.forecast(&panel, Asset::Stocks, &split, penalty)?);
        }

        println!("{:<22} {:>12} {:>12}", "Model", "MSFE", "Ratio");
        for record in evaluate_msfe(&panel, &benchmark, &models)? {
            println!(
                "{:<22} {:>12.6} {:>12.4}",
                record.model.to_string(),
                record.msfe,
                record.ratio
            );
        }

        println!();
        println!("{:<22} {:>12} {:>12}  Conclusion", "Model", "DM", "p-value");
        let dm = DieboldMariano::new(4);
        for model in &models {
            let record = dm.test_series(&panel, model, &benchmark)?;
            println!(
                "{:<22} {:>12.4} {:>12.4}  {}",
                record.model.to_string(),
                record.outcome.statistic,
                record.outcome.p_value,
                record.outcome.conclusion
            );
        }
        println!();
    }

    Ok(())
}

fn month(year: i32, month: u32) -> Result<Month, String> {
    Month::new(year, month).ok_or_else(|| format!("invalid month {year}-{month}"))
}

/// Deterministic panel: returns weakly driven by a lagged dividend-price signal.
fn demo_panel(n: usize) -> Result<Panel, Box<dyn std::error::Error>> {
    let mut dates = Vec::with_capacity(n);
    let mut current = month(1990, 1)?;
    for _ in 0..n {
        dates.push(current);
        current = current.succ().ok_or("month overflow")?;
    }

    let dp: Vec<f64> = (0..n).map(|i| 3.0 + (i as f64 * 0.13).sin()).collect();
    let tbl: Vec<f64> = (0..n).map(|i| 0.04 + 0.01 * (i as f64 * 0.05).cos()).collect();
    let stocks: Vec<f64> = (0..n)
        .map(|i| 0.002 * dp[i] - 0.004 + 0.04 * (i as f64 * 2.1).sin())
        .collect();
    let bonds: Vec<f64> = (0..n)
        .map(|i| 0.1 * tbl[i] - 0.002 + 0.01 * (i as f64 * 1.3).cos())
        .collect();

    Ok(Panel::new(dates)?
        .with_dense_column("dp", &dp)?
        .with_dense_column("tbl", &tbl)?
        .with_dense_column(columns::EXCESS_RETURN_STOCKS, &stocks)?
        .with_dense_column(columns::EXCESS_RETURN_BONDS, &bonds)?)
}
