//! Demonstration of holdout-output
//!
//! Builds a small MSFE table and a portfolio comparison, prints them, and
//! writes them as CSV files and a JSON workbook into a temporary directory.

use holdout_output::{
    Cell, ComparativeAnalysis, ExportFormat, Exporter, PerformanceRow, ResultSet, Workbook,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("==========================================================");
    println!("          Holdout Output - Demo");
    println!("==========================================================\n");

    let mut msfe = ResultSet::new("recursive.msfe", ["Asset", "Model", "MSFE", "MSFE Ratio"]);
    for (model, value) in [
        ("Mean_Forecast", 0.001_950),
        ("Forecast_tbl", 0.001_972),
        ("Combined_Forecast", 0.001_941),
    ] {
        msfe.push_row(vec![
            Cell::text("Stocks"),
            Cell::text(model),
            Cell::number(value),
            Cell::number(value / 0.001_950),
        ])?;
    }
    println!("{}", msfe.to_ascii_table(6));

    let comparison = ComparativeAnalysis::new(
        vec![
            PerformanceRow::new("Forecast_tbl", 0.071, 0.152, 0.467),
            PerformanceRow::new("Combined_Forecast", 0.074, 0.139, 0.532),
        ],
        Some(PerformanceRow::new("Mean_Forecast", 0.066, 0.148, 0.446)),
    );
    println!("{}", comparison.to_ascii_table());
    println!("{}", comparison.to_markdown());

    let mut workbook = Workbook::new();
    workbook.push(msfe)?;
    workbook.push(comparison.to_result_set("recursive.comparison")?)?;

    let dir = std::env::temp_dir().join("holdout-export-demo");
    for path in workbook.write_dir(&dir, ExportFormat::Csv)? {
        println!("wrote {}", path.display());
    }
    for path in workbook.write_dir(&dir, ExportFormat::PrettyJson)? {
        println!("wrote {}", path.display());
    }

    println!("\nCompact JSON:\n{}", workbook.export_to_string(ExportFormat::Json)?);
    Ok(())
}
