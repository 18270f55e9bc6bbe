//! Export of result sets to CSV and JSON.
//!
//! A single [`ResultSet`] exports to one CSV table or one JSON object. A
//! [`Workbook`] collects every result set of a run and writes them to a
//! directory: one CSV file per set, or a single JSON document.

use crate::table::ResultSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// File name of the JSON workbook.
pub const WORKBOOK_JSON: &str = "results.json";

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A row does not match the header.
    #[error("Result set {set}: row has {actual} cells, expected {expected}")]
    ShapeMismatch {
        /// Result set name
        set: String,
        /// Number of columns
        expected: usize,
        /// Number of cells in the row
        actual: usize,
    },

    /// Two result sets share a name.
    #[error("Duplicate result set: {0}")]
    DuplicateSet(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    fn to_json<T: Serialize + ?Sized>(self, value: &T) -> Result<String, ExportError> {
        match self {
            Self::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
            _ => Ok(serde_json::to_string(value)?),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
            Self::PrettyJson => f.write_str("pretty-json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unknown export format '{other}' (expected csv, json or pretty-json)"
            ))),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl ResultSet {
    /// Write the header and rows as CSV.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.columns())?;
        for row in self.rows() {
            wtr.write_record(row.iter().map(|cell| cell.to_csv_field()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Exporter for ResultSet {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut buffer = Vec::new();
                self.write_csv_to(&mut buffer)?;
                String::from_utf8(buffer).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json | ExportFormat::PrettyJson => format.to_json(self),
        }
    }
}

/// Every result set of a run, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    result_sets: Vec<ResultSet>,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result set; names must be unique and usable as file names.
    pub fn push(&mut self, set: ResultSet) -> Result<(), ExportError> {
        let name = set.name();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ExportError::InvalidFormat(format!(
                "result set name '{name}' is not a valid file name"
            )));
        }
        if self.get(name).is_some() {
            return Err(ExportError::DuplicateSet(name.to_string()));
        }
        self.result_sets.push(set);
        Ok(())
    }

    /// Add several result sets.
    pub fn extend(&mut self, sets: impl IntoIterator<Item = ResultSet>) -> Result<(), ExportError> {
        for set in sets {
            self.push(set)?;
        }
        Ok(())
    }

    /// Result set by name.
    pub fn get(&self, name: &str) -> Option<&ResultSet> {
        self.result_sets.iter().find(|set| set.name() == name)
    }

    /// Result set names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.result_sets.iter().map(ResultSet::name)
    }

    /// Iterate over result sets.
    pub fn iter(&self) -> impl Iterator<Item = &ResultSet> {
        self.result_sets.iter()
    }

    /// Number of result sets.
    pub const fn len(&self) -> usize {
        self.result_sets.len()
    }

    /// True when the workbook holds no result sets.
    pub const fn is_empty(&self) -> bool {
        self.result_sets.is_empty()
    }

    /// Write the workbook into `dir`, creating it if needed.
    ///
    /// CSV writes `<name>.csv` per result set; the JSON formats write a single
    /// [`WORKBOOK_JSON`] document. Returns the paths written.
    pub fn write_dir(&self, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(dir)?;

        let paths = match format {
            ExportFormat::Csv => {
                let mut paths = Vec::with_capacity(self.len());
                for set in &self.result_sets {
                    let path = dir.join(format!("{}.{}", set.name(), format.extension()));
                    set.write_csv_to(File::create(&path)?)?;
                    paths.push(path);
                }
                paths
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                let path = dir.join(WORKBOOK_JSON);
                self.export_to_file(&path, format)?;
                vec![path]
            }
        };

        info!(
            dir = %dir.display(),
            format = %format,
            result_sets = self.len(),
            files = paths.len(),
            "results written"
        );
        Ok(paths)
    }
}

impl Exporter for Workbook {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                // Sections headed by the result set name as a comment line
                let mut output = String::new();
                for (i, set) in self.result_sets.iter().enumerate() {
                    if i > 0 {
                        output.push('\n');
                    }
                    output.push_str(&format!("# {}\n", set.name()));
                    output.push_str(&set.export_to_string(format)?);
                }
                Ok(output)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => format.to_json(self),
        }
    }
}
