//! Calendar month keys.
//!
//! Every row of a panel is identified by a [`Month`]. Source spreadsheets spell
//! dates in several ways (`199001`, `1990-01-31`, `01-1990`, spreadsheet serial
//! day numbers), all of which normalize to the same key. The canonical text form
//! is `YYYY-MM`, which also sorts chronologically.

use crate::error::{DataError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day zero of spreadsheet serial dates.
const SERIAL_ORIGIN: (i32, u32, u32) = (1899, 12, 30);

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(NaiveDate);

impl Month {
    /// Create a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Interpret a numeric date cell.
    ///
    /// Six-digit integers with a valid month part are read as `YYYYMM`; any other
    /// non-negative number is a spreadsheet serial day count from 1899-12-30.
    pub fn from_numeric(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }

        if value.fract() == 0.0 && (100_001.0..=999_912.0).contains(&value) {
            let packed = value as i64;
            let (year, month) = (packed / 100, packed % 100);
            if (1..=12).contains(&month) {
                return Self::new(year as i32, month as u32);
            }
        }

        let (y, m, d) = SERIAL_ORIGIN;
        NaiveDate::from_ymd_opt(y, m, d)?
            .checked_add_days(Days::new(value.floor() as u64))
            .map(Self::from_date)
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month number, 1 through 12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The following month.
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: Self) -> i64 {
        let years = i64::from(other.year()) - i64::from(self.year());
        years * 12 + i64::from(other.month()) - i64::from(self.month())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DataError::InvalidDate(s.to_string());
        let text = s.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        if let Ok(number) = text.parse::<f64>() {
            return Self::from_numeric(number).ok_or_else(invalid);
        }

        // Strip a time-of-day suffix such as "2000-01-31 00:00:00"
        let date_part = text.split([' ', 'T']).next().unwrap_or(text);

        for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return Ok(Self::from_date(date));
            }
        }

        // Month-only forms: YYYY-MM and MM-YYYY
        let parts: Vec<&str> = date_part.split(['-', '/']).collect();
        if let [first, second] = parts.as_slice() {
            let (year, month) = if first.len() == 4 {
                (first, second)
            } else {
                (second, first)
            };
            if let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>())
                && let Some(parsed) = Self::new(year, month)
            {
                return Ok(parsed);
            }
        }

        Err(invalid())
    }
}

impl TryFrom<String> for Month {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    #[rstest]
    #[case("199001", 1990, 1)]
    #[case("202112", 2021, 12)]
    #[case("1990-01-31", 1990, 1)]
    #[case("1990-01-31 00:00:00", 1990, 1)]
    #[case("2000-02", 2000, 2)]
    #[case("02-2000", 2000, 2)]
    #[case("03/31/2001", 2001, 3)]
    #[case("36526", 2000, 1)]
    #[case("36556.0", 2000, 1)]
    #[case("36557", 2000, 2)]
    fn test_parse_formats(#[case] text: &str, #[case] year: i32, #[case] month: u32) {
        assert_eq!(text.parse::<Month>().unwrap(), ym(year, month));
    }

    #[rstest]
    #[case("")]
    #[case("13-2000")]
    #[case("not a date")]
    #[case("-5")]
    fn test_parse_invalid(#[case] text: &str) {
        assert!(matches!(
            text.parse::<Month>(),
            Err(DataError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_invalid_yyyymm_falls_back_to_serial() {
        // 199913 has no month 13, so it is a serial day count instead
        let parsed = Month::from_numeric(199_913.0).unwrap();
        assert!(parsed.year() > 2400);
    }

    #[test]
    fn test_display_is_sortable() {
        assert_eq!(ym(1999, 3).to_string(), "1999-03");
        assert!(ym(1999, 12).to_string() < ym(2000, 1).to_string());
    }

    #[test]
    fn test_succ_and_pred_cross_year() {
        assert_eq!(ym(1999, 12).succ(), Some(ym(2000, 1)));
        assert_eq!(ym(2000, 1).pred(), Some(ym(1999, 12)));
    }

    #[test]
    fn test_months_until() {
        assert_eq!(ym(1999, 12).months_until(ym(2000, 1)), 1);
        assert_eq!(ym(2000, 1).months_until(ym(1980, 1)), -240);
    }

    #[test]
    fn test_text_conversions() {
        let text = String::from(ym(2021, 7));
        assert_eq!(text, "2021-07");
        assert_eq!(Month::try_from(text).unwrap(), ym(2021, 7));
    }
}
