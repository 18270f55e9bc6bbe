//! Holdout CLI binary.
//!
//! Merges the source files into a monthly panel, prints descriptive statistics
//! and runs the out-of-sample forecasting pipeline.

use clap::{Parser, Subcommand};
use holdout::data::{AssetStatistics, AssetSummary, Panel, PanelBuilder};
use holdout::output::ExportFormat;
use holdout::{
    PipelineConfig, PipelineResult, Scenario, ScenarioResult, build_report, build_workbook,
    run_pipeline,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "holdout")]
#[command(about = "Holdout: out-of-sample stock and bond return forecasting", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge the four source files into one monthly panel
    Merge {
        /// Predictor panel CSV (`Dates` column in YYYYMM form)
        #[arg(long)]
        predictors: PathBuf,

        /// Risk-free rate CSV
        #[arg(long)]
        risk_free: PathBuf,

        /// S&P 500 index price CSV
        #[arg(long)]
        stocks: PathBuf,

        /// Bond index price CSV
        #[arg(long)]
        bonds: PathBuf,

        /// Predictor columns to keep
        #[arg(long, value_delimiter = ',', default_values_t = holdout::data::columns::DEFAULT_PREDICTORS.map(String::from))]
        columns: Vec<String>,

        /// Output panel CSV
        #[arg(long, default_value = "data.csv")]
        out: PathBuf,
    },

    /// Print descriptive statistics of both excess returns
    Stats {
        /// Merged panel CSV
        #[arg(long, default_value = "data.csv")]
        panel: PathBuf,
    },

    /// Run the forecasting pipeline
    Run {
        /// Merged panel CSV
        #[arg(long, default_value = "data.csv")]
        panel: PathBuf,

        /// Pipeline configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run a single scenario (recursive or rolling)
        #[arg(long)]
        scenario: Option<Scenario>,

        /// Directory for result sets and the run report
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,

        /// Result set format (csv, json or pretty-json)
        #[arg(long, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}

/// Logs go to stderr so tables on stdout stay clean.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Merge {
            predictors,
            risk_free,
            stocks,
            bonds,
            columns,
            out,
        } => merge(&predictors, &risk_free, &stocks, &bonds, &columns, &out),
        Commands::Stats { panel } => stats(&panel),
        Commands::Run {
            panel,
            config,
            scenario,
            out_dir,
            format,
        } => run_forecasts(&panel, config.as_deref(), scenario, &out_dir, format),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(72));
    println!("{title:^72}");
    println!("{}", "=".repeat(72));
}

fn merge(
    predictors: &Path,
    risk_free: &Path,
    stocks: &Path,
    bonds: &Path,
    predictor_columns: &[String],
    out: &Path,
) -> Result<(), Box<dyn Error>> {
    let pb = spinner("Merging source files...");
    let panel = match PanelBuilder::new(predictors, risk_free, stocks, bonds, predictor_columns)
        .build()
    {
        Ok(panel) => panel,
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };
    panel.write_csv(out)?;
    pb.finish_with_message(format!("Wrote {}", out.display()));

    banner("MERGED PANEL");
    println!("{:<20} {:>12}", "Rows", panel.len());
    if let (Some(first), Some(last)) = (panel.first_month(), panel.last_month()) {
        println!("{:<20} {:>12}", "First month", first.to_string());
        println!("{:<20} {:>12}", "Last month", last.to_string());
    }
    println!("\nColumns:");
    for name in panel.column_names() {
        println!("  {name}");
    }
    Ok(())
}

fn stats(path: &Path) -> Result<(), Box<dyn Error>> {
    let panel = Panel::read_csv(path)?;
    let summary = AssetSummary::from_panel(&panel)?;

    banner("EXCESS RETURN STATISTICS");
    print!("{:<24}", "Statistic");
    for (asset, _) in &summary.assets {
        print!(" {:>14}", asset.index_name());
    }
    println!();
    println!("{}", "-".repeat(24 + 15 * summary.assets.len()));

    let rows: [(&str, fn(&AssetStatistics) -> f64); 5] = [
        ("Annualized Mean", |s| s.annualized_mean),
        ("Annualized Volatility", |s| s.annualized_volatility),
        ("Sharpe Ratio", |s| s.sharpe_ratio),
        ("Skewness", |s| s.skewness),
        ("Kurtosis", |s| s.kurtosis),
    ];
    for (label, value) in rows {
        print!("{label:<24}");
        for (_, statistics) in &summary.assets {
            print!(" {:>14.4}", value(statistics));
        }
        println!();
    }
    print!("{:<24}", "Observations");
    for (_, statistics) in &summary.assets {
        print!(" {:>14}", statistics.observations);
    }
    println!();
    Ok(())
}

fn run_forecasts(
    panel_path: &Path,
    config_path: Option<&Path>,
    scenario: Option<Scenario>,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<(), Box<dyn Error>> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(scenario) = scenario {
        config.scenarios = vec![scenario];
    }

    let panel = Panel::read_csv(panel_path)?;

    let pb = spinner("Running forecasts...");
    let result = match run_pipeline(&panel, &config) {
        Ok(result) => result,
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };
    pb.finish_with_message(format!("Completed {} scenario(s)", result.scenarios.len()));

    let workbook = build_workbook(&panel, &result)?;
    for scenario_result in &result.scenarios {
        print_scenario(&workbook, scenario_result)?;
    }

    let written = workbook.write_dir(out_dir, format)?;
    let report = build_report(&result)?.write_to_dir(out_dir)?;
    println!(
        "\nWrote {} result file(s) and {} to {}",
        written.len(),
        report.display(),
        out_dir.display()
    );
    print_failures(&result);
    Ok(())
}

fn print_scenario(
    workbook: &holdout::output::Workbook,
    result: &ScenarioResult,
) -> Result<(), Box<dyn Error>> {
    banner(&format!("{} SCENARIO", result.scenario.name().to_uppercase()));
    for set in ["msfe", "dm_test"] {
        let name = format!("{}.{set}", result.scenario.name());
        let table = workbook
            .get(&name)
            .ok_or_else(|| format!("result set {name} is missing"))?;
        println!("{}", table.to_ascii_table(6));
    }
    if result.comparison.rows().next().is_some() {
        println!("{}", result.comparison.to_ascii_table());
    }
    Ok(())
}

fn print_failures(result: &PipelineResult) {
    let failures: Vec<_> = result.failures().collect();
    if failures.is_empty() {
        return;
    }
    println!("\n{} stage(s) failed without stopping the run:", failures.len());
    for failure in failures {
        println!("  {failure}");
    }
}
