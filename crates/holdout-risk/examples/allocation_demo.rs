//! Demonstration of holdout-risk
//!
//! Builds a deterministic stock/bond panel, then:
//! - estimates recursive and rolling covariance series
//! - forms tangency weights from the last matrix and trailing mean returns
//! - reports annualized statistics of the weighted portfolio

use holdout_data::{Month, Panel, columns};
use holdout_risk::{
    CovarianceConfig, CovarianceWindow, PortfolioStatistics, PortfolioWeights, WindowCovariance,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("==========================================================");
    println!("          Holdout Allocation - Demo");
    println!("==========================================================\n");

    let (panel, stocks, bonds) = demo_panel(96)?;
    let mu_stocks = stocks.iter().sum::<f64>() / stocks.len() as f64;
    let mu_bonds = bonds.iter().sum::<f64>() / bonds.len() as f64;

    for window in [CovarianceWindow::Recursive, CovarianceWindow::Rolling] {
        let config = CovarianceConfig {
            initial_window: 36,
            window,
        };
        let series = WindowCovariance::new(config).estimate(&panel)?;
        let (date, last) = series.last().ok_or("no covariance windows")?;

        println!("----------------------------------------------------------");
        println!("{window:?} covariance: {} windows, last at {date}", series.len());
        println!("----------------------------------------------------------");
        println!("{:<20} {:>12} {:>12}", "", "Stocks", "Bonds");
        println!(
            "{:<20} {:>12.6} {:>12.6}",
            "Stocks", last.var_stocks, last.cov_stocks_bonds
        );
        println!(
            "{:<20} {:>12.6} {:>12.6}",
            "Bonds", last.cov_bonds_stocks, last.var_bonds
        );

        let weights = PortfolioWeights::tangency(mu_stocks, mu_bonds, last)?;
        let stats = PortfolioStatistics::from_panel(&panel, &weights)?;
        println!();
        println!("{:<20} {:>12.4}", "Weight (Stocks)", weights.stocks);
        println!("{:<20} {:>12.4}", "Weight (Bonds)", weights.bonds);
        println!("{:<20} {:>12.4}", "Mean Return", stats.mean_return);
        println!("{:<20} {:>12.4}", "Volatility", stats.volatility);
        println!("{:<20} {:>12.4}", "Sharpe Ratio", stats.sharpe_ratio);
        println!();
    }

    Ok(())
}

type DemoPanel = (Panel, Vec<f64>, Vec<f64>);

/// Deterministic monthly excess returns with mild co-movement.
fn demo_panel(n: usize) -> Result<DemoPanel, Box<dyn std::error::Error>> {
    let mut dates = Vec::with_capacity(n);
    let mut current = Month::new(2000, 1).ok_or("invalid month")?;
    for _ in 0..n {
        dates.push(current);
        current = current.succ().ok_or("month overflow")?;
    }

    let common: Vec<f64> = (0..n).map(|i| (i as f64 * 0.9).sin()).collect();
    let stocks: Vec<f64> = (0..n)
        .map(|i| 0.006 + 0.03 * common[i] + 0.02 * (i as f64 * 2.3).cos())
        .collect();
    let bonds: Vec<f64> = (0..n)
        .map(|i| 0.002 + 0.004 * common[i] + 0.008 * (i as f64 * 1.1).sin())
        .collect();

    let panel = Panel::new(dates)?
        .with_dense_column(columns::EXCESS_RETURN_STOCKS, &stocks)?
        .with_dense_column(columns::EXCESS_RETURN_BONDS, &bonds)?;
    Ok((panel, stocks, bonds))
}
