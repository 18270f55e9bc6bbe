//! Named result sets.
//!
//! A [`ResultSet`] is one "sheet" of the pipeline's output: a name, an ordered
//! list of column headers and rows of [`Cell`]s. Names and headers are part of
//! the external interface, so downstream readers can rely on them.

use crate::export::ExportError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One value in a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Missing value
    Empty,
}

impl Cell {
    /// Numeric cell; non-finite values become [`Cell::Empty`].
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Empty
        }
    }

    /// Text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The numeric value, if any.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The text value, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Field as written to CSV: shortest round-trip numbers, empty when missing.
    pub fn to_csv_field(&self) -> String {
        match self {
            Self::Number(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Empty => String::new(),
        }
    }

    fn display(&self, precision: usize) -> String {
        match self {
            Self::Number(v) => format!("{v:.precision$}"),
            Self::Text(s) => s.clone(),
            Self::Empty => "-".to_string(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::number)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv_field())
    }
}

/// A named table with fixed column headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row with one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), ExportError> {
        if row.len() != self.columns.len() {
            return Err(ExportError::ShapeMismatch {
                set: self.name.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Result set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column headers.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the set has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cells of one column.
    pub fn column(&self, column: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Render as an aligned plain-text table.
    ///
    /// The first column is left-aligned, the rest right-aligned, with numbers
    /// shown to `precision` decimals.
    pub fn to_ascii_table(&self, precision: usize) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.display(precision)).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                rendered
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

        let mut output = String::new();
        output.push_str(&format!("{}\n", self.name));
        output.push_str(&"=".repeat(total));
        output.push('\n');
        output.push_str(&format_line(&self.columns, &widths));
        output.push_str(&"-".repeat(total));
        output.push('\n');
        for row in &rendered {
            output.push_str(&format_line(row, &widths));
        }
        output
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == 0 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msfe_set() -> ResultSet {
        let mut set = ResultSet::new("recursive.msfe", ["Asset", "Model", "MSFE", "MSFE Ratio"]);
        set.push_row(vec![
            "Stocks".into(),
            "Mean_Forecast".into(),
            0.0021.into(),
            1.0.into(),
        ])
        .unwrap();
        set.push_row(vec![
            "Stocks".into(),
            "Forecast_tbl".into(),
            0.0022.into(),
            Cell::number(f64::NAN),
        ])
        .unwrap();
        set
    }

    #[test]
    fn test_push_row_checks_shape() {
        let mut set = msfe_set();
        let err = set.push_row(vec!["Bonds".into()]).unwrap_err();
        assert!(matches!(
            err,
            ExportError::ShapeMismatch {
                expected: 4,
                actual: 1,
                ..
            }
        ));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_non_finite_numbers_are_empty() {
        let set = msfe_set();
        assert_eq!(set.rows()[1][3], Cell::Empty);
        assert_eq!(Cell::from(None::<f64>), Cell::Empty);
        assert_eq!(Cell::from(Some(0.5)).as_number(), Some(0.5));
    }

    #[test]
    fn test_column_lookup() {
        let set = msfe_set();
        assert_eq!(set.column_index("MSFE"), Some(2));
        let models: Vec<_> = set
            .column("Model")
            .unwrap()
            .into_iter()
            .filter_map(Cell::as_text)
            .collect();
        assert_eq!(models, vec!["Mean_Forecast", "Forecast_tbl"]);
        assert!(set.column("Missing").is_none());
    }

    #[test]
    fn test_ascii_table_alignment() {
        let table = msfe_set().to_ascii_table(4);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "recursive.msfe");
        assert!(lines[2].starts_with("Asset"));
        assert!(lines[4].contains("Mean_Forecast"));
        assert!(lines[4].ends_with("1.0000"));
        assert!(lines[5].ends_with('-'));
    }
}
