//! Error types for panel operations.

use crate::Month;
use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building, reading or querying a panel.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required column is absent from a source or from the panel
    #[error("Missing column '{column}' in {source_name}")]
    MissingColumn {
        /// Column that was looked up
        column: String,
        /// Source or table the column was expected in
        source_name: String,
    },

    /// A required value is null
    #[error("Missing data in {source_name}: {reason}")]
    MissingData {
        /// Source or table the value was expected in
        source_name: String,
        /// Reason for missing data
        reason: String,
    },

    /// Date text that cannot be mapped to a calendar month
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The same month appears twice
    #[error("Duplicate month {0} in panel")]
    DuplicateMonth(Month),

    /// Months are not in chronological order
    #[error("Months out of order: {later} appears before {earlier}")]
    Unsorted {
        /// Month found first
        later: Month,
        /// Month found after it
        earlier: Month,
    },

    /// A calendar month is missing inside the panel span
    #[error("Gap in panel: no row between {after} and {before}")]
    MonthGap {
        /// Last month before the gap
        after: Month,
        /// First month after the gap
        before: Month,
    },

    /// Requested month is outside the panel
    #[error("Month {0} is not in the panel")]
    MissingMonth(Month),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start month of the range
        start: Month,
        /// End month of the range
        end: Month,
    },

    /// Column length does not match the number of panel rows
    #[error("Column '{column}' has {actual} values, panel has {expected} rows")]
    LengthMismatch {
        /// Column name
        column: String,
        /// Number of panel rows
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Too few observations for a statistic
    #[error("Insufficient data for {statistic}: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Statistic being computed
        statistic: String,
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// A denominator that must be positive is zero
    #[error("Degenerate {0}: zero denominator")]
    Degenerate(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
