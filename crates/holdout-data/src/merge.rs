//! Panel Builder.
//!
//! Merges four sources (predictors, risk-free rate, equity index prices and bond
//! index prices) into one aligned monthly [`Panel`]:
//!
//! 1. every source's date column is normalized to a [`Month`] key
//! 2. selected value columns are renamed to their panel names
//! 3. predictors ⋈ equity (inner) ⋈ risk-free (left) ⋈ bonds (inner) on `Date`
//! 4. simple returns of both price series, then excess returns over the risk-free rate

use crate::error::{DataError, Result};
use crate::month::Month;
use crate::panel::{Panel, columns, float_values, month_keys, read_csv_frame};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One input file and the columns taken from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Human-readable source name used in errors
    pub name: String,
    /// CSV file path
    pub path: PathBuf,
    /// Name of the date column in the file
    pub date_column: String,
    /// `(source column, panel column)` pairs
    pub columns: Vec<(String, String)>,
}

impl SourceFile {
    /// Predictor panel with a `Dates` column in `YYYYMM` form.
    pub fn predictors(path: impl Into<PathBuf>, predictors: &[String]) -> Self {
        Self {
            name: "predictors".to_string(),
            path: path.into(),
            date_column: "Dates".to_string(),
            columns: predictors.iter().map(|p| (p.clone(), p.clone())).collect(),
        }
    }

    /// Monthly risk-free rate keyed by spreadsheet serial dates.
    pub fn risk_free(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "risk-free rate".to_string(),
            path: path.into(),
            date_column: "Date".to_string(),
            columns: vec![(
                "Risk free rate of return ".to_string(),
                columns::RISK_FREE_RATE.to_string(),
            )],
        }
    }

    /// S&P 500 index levels.
    pub fn sp500(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "S&P 500 prices".to_string(),
            path: path.into(),
            date_column: "Dates".to_string(),
            columns: vec![("SP500 index price".to_string(), columns::SP500.to_string())],
        }
    }

    /// Bond index levels.
    pub fn bond_index(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "bond index prices".to_string(),
            path: path.into(),
            date_column: "Dates".to_string(),
            columns: vec![(
                "LBUSTRUU Index price".to_string(),
                columns::LBUSTRUU.to_string(),
            )],
        }
    }

    /// Read the file into a data frame.
    pub fn load(&self) -> Result<DataFrame> {
        if !self.path.exists() {
            return Err(DataError::MissingData {
                source_name: self.name.clone(),
                reason: format!("file not found: {}", self.path.display()),
            });
        }
        read_csv_frame(&self.path)
    }

    /// Reduce a raw source frame to a `Date` key column plus renamed value columns.
    pub fn normalize(&self, df: &DataFrame) -> Result<DataFrame> {
        let missing = |column: &str| DataError::MissingColumn {
            column: column.to_string(),
            source_name: self.name.clone(),
        };

        let date = df
            .column(&self.date_column)
            .map_err(|_| missing(&self.date_column))?;
        let keys: Vec<String> = month_keys(date, &self.name)?
            .iter()
            .map(Month::to_string)
            .collect();

        let mut out: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        out.push(Series::new(columns::DATE.into(), keys).into());
        for (from, to) in &self.columns {
            let column = df.column(from).map_err(|_| missing(from))?;
            out.push(Series::new(to.as_str().into(), float_values(column)?).into());
        }

        Ok(DataFrame::new(out)?)
    }
}

/// Raw source frames, before normalization.
#[derive(Debug, Clone)]
pub struct SourceFrames {
    /// Predictor panel
    pub predictors: DataFrame,
    /// Risk-free rate
    pub risk_free: DataFrame,
    /// Equity index prices
    pub stocks: DataFrame,
    /// Bond index prices
    pub bonds: DataFrame,
}

/// Builds the monthly panel from the four source files.
#[derive(Debug, Clone)]
pub struct PanelBuilder {
    predictors: SourceFile,
    risk_free: SourceFile,
    stocks: SourceFile,
    bonds: SourceFile,
}

impl PanelBuilder {
    /// Create a builder over the default source layouts.
    ///
    /// # Arguments
    /// * `predictors` - Predictor panel CSV
    /// * `risk_free` - Risk-free rate CSV
    /// * `stocks` - S&P 500 price CSV
    /// * `bonds` - Bond index price CSV
    /// * `predictor_columns` - Predictor columns to keep
    pub fn new(
        predictors: impl AsRef<Path>,
        risk_free: impl AsRef<Path>,
        stocks: impl AsRef<Path>,
        bonds: impl AsRef<Path>,
        predictor_columns: &[String],
    ) -> Self {
        Self {
            predictors: SourceFile::predictors(predictors.as_ref(), predictor_columns),
            risk_free: SourceFile::risk_free(risk_free.as_ref()),
            stocks: SourceFile::sp500(stocks.as_ref()),
            bonds: SourceFile::bond_index(bonds.as_ref()),
        }
    }

    /// Load every source and merge them.
    pub fn build(&self) -> Result<Panel> {
        let frames = SourceFrames {
            predictors: self.predictors.load()?,
            risk_free: self.risk_free.load()?,
            stocks: self.stocks.load()?,
            bonds: self.bonds.load()?,
        };
        self.merge(&frames)
    }

    /// Merge already-loaded source frames.
    pub fn merge(&self, frames: &SourceFrames) -> Result<Panel> {
        let predictors = self.predictors.normalize(&frames.predictors)?;
        let risk_free = self.risk_free.normalize(&frames.risk_free)?;
        let stocks = self.stocks.normalize(&frames.stocks)?;
        let bonds = self.bonds.normalize(&frames.bonds)?;
        debug!(
            predictors = predictors.height(),
            risk_free = risk_free.height(),
            stocks = stocks.height(),
            bonds = bonds.height(),
            "normalized sources"
        );

        let merged = merge_normalized(predictors, stocks, risk_free, bonds)?;
        let panel = Panel::from_dataframe(&merged)?;
        info!(
            rows = panel.len(),
            first = ?panel.first_month().map(|m| m.to_string()),
            last = ?panel.last_month().map(|m| m.to_string()),
            "merged panel"
        );
        Ok(panel)
    }
}

/// Join normalized sources and derive return columns.
fn merge_normalized(
    predictors: DataFrame,
    stocks: DataFrame,
    risk_free: DataFrame,
    bonds: DataFrame,
) -> Result<DataFrame> {
    let date = || [col(columns::DATE)];
    let simple_return = |price: &str| col(price) / col(price).shift(lit(1)) - lit(1.0);

    let merged = predictors
        .lazy()
        .join(
            stocks.lazy(),
            date(),
            date(),
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            risk_free.lazy(),
            date(),
            date(),
            JoinArgs::new(JoinType::Left),
        )
        .join(bonds.lazy(), date(), date(), JoinArgs::new(JoinType::Inner))
        .sort([columns::DATE], Default::default())
        .with_columns([
            simple_return(columns::SP500).alias(columns::SP500_RETURN),
            simple_return(columns::LBUSTRUU).alias(columns::LBUSTRUU_RETURN),
        ])
        .with_columns([
            (col(columns::SP500_RETURN) - col(columns::RISK_FREE_RATE))
                .alias(columns::EXCESS_RETURN_STOCKS),
            (col(columns::LBUSTRUU_RETURN) - col(columns::RISK_FREE_RATE))
                .alias(columns::EXCESS_RETURN_BONDS),
        ])
        .collect()?;

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn predictor_names() -> Vec<String> {
        vec!["E12".to_string(), "b/m".to_string()]
    }

    fn frames() -> SourceFrames {
        SourceFrames {
            predictors: df!(
                "Dates" => [199912i64, 200001, 200002, 200003],
                "E12" => [1.0, 1.1, 1.2, 1.3],
                "b/m" => [0.5, 0.4, 0.3, 0.2],
                "ignored" => [9.0, 9.0, 9.0, 9.0],
            )
            .unwrap(),
            // 1999-12-31, 2000-01-31, 2000-02-29 as serial day numbers
            risk_free: df!(
                "Date" => [36525i64, 36556, 36585],
                "Risk free rate of return " => [0.001, 0.002, 0.003],
            )
            .unwrap(),
            stocks: df!(
                "Dates" => ["1999-12-31", "2000-01-31", "2000-02-29", "2000-03-31"],
                "SP500 index price" => [100.0, 110.0, 99.0, 99.0],
            )
            .unwrap(),
            bonds: df!(
                "Dates" => ["2000-01-31", "2000-02-29", "2000-03-31"],
                "LBUSTRUU Index price" => [200.0, 202.0, 201.0],
            )
            .unwrap(),
        }
    }

    fn builder() -> PanelBuilder {
        PanelBuilder::new("p.csv", "r.csv", "s.csv", "b.csv", &predictor_names())
    }

    #[test]
    fn test_merge_joins_and_derives_returns() {
        let panel = builder().merge(&frames()).unwrap();

        // Bond inner join drops 1999-12
        assert_eq!(panel.len(), 3);
        assert_eq!(panel.dates()[0], Month::new(2000, 1).unwrap());
        assert!(!panel.has_column("ignored"));

        // First row has no previous price
        let stocks = panel.column(columns::SP500_RETURN).unwrap();
        assert_eq!(stocks[0], None);
        assert_relative_eq!(stocks[1].unwrap(), -0.1, epsilon = 1e-12);
        assert_relative_eq!(stocks[2].unwrap(), 0.0, epsilon = 1e-12);

        let excess = panel.column(columns::EXCESS_RETURN_STOCKS).unwrap();
        assert_relative_eq!(excess[1].unwrap(), -0.1 - 0.003, epsilon = 1e-12);

        // Left join keeps 2000-03 with a missing risk-free rate
        let rf = panel.column(columns::RISK_FREE_RATE).unwrap();
        assert_eq!(rf[2], None);
        assert_eq!(excess[2], None);

        let bonds = panel.column(columns::EXCESS_RETURN_BONDS).unwrap();
        assert_relative_eq!(bonds[1].unwrap(), 0.01 - 0.003, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_source_column() {
        let mut frames = frames();
        frames.stocks = df!(
            "Dates" => ["2000-01-31"],
            "Close" => [1.0],
        )
        .unwrap();

        let err = builder().merge(&frames).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "SP500 index price"));
    }

    #[test]
    fn test_duplicate_month_rejected() {
        let mut frames = frames();
        frames.bonds = df!(
            "Dates" => ["2000-01-31", "2000-01-15", "2000-02-29"],
            "LBUSTRUU Index price" => [200.0, 201.0, 202.0],
        )
        .unwrap();

        let err = builder().merge(&frames).unwrap_err();
        assert!(matches!(err, DataError::DuplicateMonth(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = builder().build().unwrap_err();
        assert!(matches!(err, DataError::MissingData { .. }));
    }
}
