//! The aligned monthly panel.
//!
//! A [`Panel`] holds one row per calendar month, with no gaps and no duplicates,
//! and any number of named numeric columns. Missing observations are `None`;
//! non-finite values are treated as missing when a column is added.

use crate::asset::Asset;
use crate::error::{DataError, Result};
use crate::month::Month;
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

/// Column names of the merged panel.
pub mod columns {
    /// Month key column
    pub const DATE: &str = "Date";
    /// Monthly risk-free rate
    pub const RISK_FREE_RATE: &str = "Risk_Free_Rate";
    /// S&P 500 index level
    pub const SP500: &str = "SP500";
    /// Bloomberg US Aggregate bond index level
    pub const LBUSTRUU: &str = "LBUSTRUU";
    /// Simple monthly return of the S&P 500
    pub const SP500_RETURN: &str = "SP500_Return";
    /// Simple monthly return of the bond index
    pub const LBUSTRUU_RETURN: &str = "LBUSTRUU_Return";
    /// Equity return in excess of the risk-free rate
    pub const EXCESS_RETURN_STOCKS: &str = "Excess_Return_Stocks";
    /// Bond return in excess of the risk-free rate
    pub const EXCESS_RETURN_BONDS: &str = "Excess_Return_Bonds";

    /// Predictor columns used by the forecasting models unless configured otherwise:
    /// twelve-month earnings, book-to-market, treasury bill rate, net equity
    /// expansion and inflation.
    pub const DEFAULT_PREDICTORS: [&str; 5] = ["E12", "b/m", "tbl", "ntis", "infl"];
}

/// A named column of optional observations.
#[derive(Debug, Clone, PartialEq)]
struct PanelColumn {
    name: String,
    values: Vec<Option<f64>>,
}

/// Monthly panel of returns and predictors.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    dates: Vec<Month>,
    columns: Vec<PanelColumn>,
}

impl Panel {
    /// Create a panel over `dates`, which must be consecutive calendar months.
    pub fn new(dates: Vec<Month>) -> Result<Self> {
        for pair in dates.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            match earlier.months_until(later) {
                1 => {}
                0 => return Err(DataError::DuplicateMonth(later)),
                n if n < 0 => {
                    return Err(DataError::Unsorted {
                        later: earlier,
                        earlier: later,
                    });
                }
                _ => {
                    return Err(DataError::MonthGap {
                        after: earlier,
                        before: later,
                    });
                }
            }
        }

        Ok(Self {
            dates,
            columns: Vec::new(),
        })
    }

    /// Add or replace a column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(DataError::LengthMismatch {
                column: name,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }

        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(PanelColumn { name, values }),
        }

        Ok(self)
    }

    /// Add or replace a column with no missing values.
    pub fn with_dense_column(self, name: impl Into<String>, values: &[f64]) -> Result<Self> {
        self.with_column(name, values.iter().copied().map(Some).collect())
    }

    /// Number of rows (months).
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the panel has no rows.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row months in chronological order.
    pub fn dates(&self) -> &[Month] {
        &self.dates
    }

    /// First month of the panel.
    pub fn first_month(&self) -> Option<Month> {
        self.dates.first().copied()
    }

    /// Last month of the panel.
    pub fn last_month(&self) -> Option<Month> {
        self.dates.last().copied()
    }

    /// Column names in insertion order (excluding the date column).
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Values of a column.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
                source_name: "panel".to_string(),
            })
    }

    /// Excess returns of an asset.
    pub fn excess_returns(&self, asset: Asset) -> Result<&[Option<f64>]> {
        self.column(asset.excess_return_column())
    }

    /// Row index of a month.
    pub fn position(&self, month: Month) -> Option<usize> {
        let first = self.first_month()?;
        let offset = usize::try_from(first.months_until(month)).ok()?;
        (offset < self.len()).then_some(offset)
    }

    /// Row index of a month, failing when the month is outside the panel.
    pub fn require_position(&self, month: Month) -> Result<usize> {
        self.position(month).ok_or(DataError::MissingMonth(month))
    }

    /// Rows whose month lies in `[start, end]`, clamped to the panel span.
    pub fn row_range(&self, start: Month, end: Month) -> Result<Range<usize>> {
        if start > end {
            return Err(DataError::InvalidDateRange { start, end });
        }

        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        if lo >= hi {
            return Err(DataError::MissingData {
                source_name: "panel".to_string(),
                reason: format!("no rows between {start} and {end}"),
            });
        }

        Ok(lo..hi)
    }

    /// Indices of rows where every listed column is present.
    pub fn complete_rows(&self, names: &[&str]) -> Result<Vec<usize>> {
        let selected = names
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.len())
            .filter(|&row| selected.iter().all(|values| values[row].is_some()))
            .collect())
    }

    /// Build a panel from a data frame with a `Date` column.
    ///
    /// Every other column is cast to `Float64`.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let date_column = df
            .column(columns::DATE)
            .map_err(|_| DataError::MissingColumn {
                column: columns::DATE.to_string(),
                source_name: "panel".to_string(),
            })?;

        let mut panel = Self::new(month_keys(date_column, "panel")?)?;
        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == columns::DATE {
                continue;
            }
            panel = panel.with_column(name, float_values(column)?)?;
        }

        Ok(panel)
    }

    /// Read a panel previously written with [`Panel::write_csv`].
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let df = read_csv_frame(path.as_ref())?;
        Self::from_dataframe(&df)
    }

    /// Write the panel as CSV with a leading `Date` column.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv_to(file)
    }

    /// Write the panel as CSV to any writer.
    ///
    /// Values use the shortest representation that parses back to the same `f64`,
    /// and missing values are empty fields.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec![columns::DATE.to_string()];
        header.extend(self.columns.iter().map(|c| c.name.clone()));
        wtr.write_record(&header)?;

        for (row, date) in self.dates.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(date.to_string());
            for column in &self.columns {
                record.push(column.values[row].map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Read a CSV file with a header row into a data frame.
pub(crate) fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Parse every cell of a date column into a month.
pub(crate) fn month_keys(column: &Column, source_name: &str) -> Result<Vec<Month>> {
    let text = column.cast(&DataType::String)?;
    text.as_materialized_series()
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Some(value) => value.parse(),
            None => Err(DataError::MissingData {
                source_name: source_name.to_string(),
                reason: format!("null date in row {row}"),
            }),
        })
        .collect()
}

/// Cast a column to `Float64` and collect its values.
pub(crate) fn float_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast.as_materialized_series().f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months(start_year: i32, start_month: u32, n: usize) -> Vec<Month> {
        let mut out = Vec::with_capacity(n);
        let mut current = Month::new(start_year, start_month).unwrap();
        for _ in 0..n {
            out.push(current);
            current = current.succ().unwrap();
        }
        out
    }

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let dates = vec![ym(2000, 1), ym(2000, 1)];
        assert!(matches!(
            Panel::new(dates),
            Err(DataError::DuplicateMonth(_))
        ));
    }

    #[test]
    fn test_new_rejects_unsorted() {
        let dates = vec![ym(2000, 2), ym(2000, 1)];
        assert!(matches!(Panel::new(dates), Err(DataError::Unsorted { .. })));
    }

    #[test]
    fn test_new_rejects_gaps() {
        let dates = vec![ym(2000, 1), ym(2000, 3)];
        assert!(matches!(Panel::new(dates), Err(DataError::MonthGap { .. })));
    }

    #[test]
    fn test_with_column_length_mismatch() {
        let panel = Panel::new(months(2000, 1, 3)).unwrap();
        let result = panel.with_column("x", vec![Some(1.0)]);
        assert!(matches!(result, Err(DataError::LengthMismatch { .. })));
    }

    #[test]
    fn test_non_finite_values_become_missing() {
        let panel = Panel::new(months(2000, 1, 3))
            .unwrap()
            .with_column("x", vec![Some(1.0), Some(f64::NAN), Some(f64::INFINITY)])
            .unwrap();
        assert_eq!(panel.column("x").unwrap(), &[Some(1.0), None, None]);
    }

    #[test]
    fn test_with_column_replaces_existing() {
        let panel = Panel::new(months(2000, 1, 2))
            .unwrap()
            .with_dense_column("x", &[1.0, 2.0])
            .unwrap()
            .with_dense_column("x", &[3.0, 4.0])
            .unwrap();
        assert_eq!(panel.column_names().count(), 1);
        assert_eq!(panel.column("x").unwrap(), &[Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_missing_column() {
        let panel = Panel::new(months(2000, 1, 2)).unwrap();
        assert!(matches!(
            panel.column("nope"),
            Err(DataError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_position_and_row_range() {
        let panel = Panel::new(months(1999, 11, 6)).unwrap();
        assert_eq!(panel.position(ym(1999, 11)), Some(0));
        assert_eq!(panel.position(ym(2000, 2)), Some(3));
        assert_eq!(panel.position(ym(2001, 1)), None);
        assert_eq!(panel.position(ym(1999, 1)), None);

        assert_eq!(panel.row_range(ym(2000, 1), ym(2000, 3)).unwrap(), 2..5);
        // Clamped to the panel span
        assert_eq!(panel.row_range(ym(1990, 1), ym(2030, 1)).unwrap(), 0..6);
        assert!(panel.row_range(ym(2000, 3), ym(2000, 1)).is_err());
        assert!(panel.row_range(ym(2010, 1), ym(2011, 1)).is_err());
    }

    #[test]
    fn test_complete_rows() {
        let panel = Panel::new(months(2000, 1, 4))
            .unwrap()
            .with_column("a", vec![None, Some(1.0), Some(2.0), Some(3.0)])
            .unwrap()
            .with_column("b", vec![Some(1.0), Some(1.0), None, Some(3.0)])
            .unwrap();
        assert_eq!(panel.complete_rows(&["a", "b"]).unwrap(), vec![1, 3]);
        assert_eq!(panel.complete_rows(&["a"]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_csv_roundtrip_is_exact() {
        let panel = Panel::new(months(2000, 1, 3))
            .unwrap()
            .with_column("b/m", vec![Some(0.1), None, Some(1.0 / 3.0)])
            .unwrap()
            .with_column(
                columns::EXCESS_RETURN_STOCKS,
                vec![Some(-0.012_345_678_9), Some(1e-12), Some(0.0)],
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        panel.write_csv(&path).unwrap();
        let back = Panel::read_csv(&path).unwrap();

        assert_eq!(back, panel);
    }
}
