//! Sample split and estimation windows.

use crate::error::{ForecastError, Result};
use holdout_data::{Month, Panel};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// In-sample and out-of-sample periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSplit {
    /// First in-sample month
    pub in_sample_start: Month,
    /// Last in-sample month
    pub in_sample_end: Month,
    /// First forecast month
    pub out_sample_start: Month,
    /// Last forecast month (`None` = last panel month)
    pub out_sample_end: Option<Month>,
}

impl SampleSplit {
    /// Create a split, checking that the periods are ordered and disjoint.
    pub fn new(
        in_sample_start: Month,
        in_sample_end: Month,
        out_sample_start: Month,
        out_sample_end: Option<Month>,
    ) -> Result<Self> {
        if in_sample_start > in_sample_end {
            return Err(ForecastError::InvalidParameter(format!(
                "in-sample start {in_sample_start} is after in-sample end {in_sample_end}"
            )));
        }
        if in_sample_end >= out_sample_start {
            return Err(ForecastError::InvalidParameter(format!(
                "in-sample end {in_sample_end} must precede out-of-sample start {out_sample_start}"
            )));
        }
        if let Some(end) = out_sample_end
            && end < out_sample_start
        {
            return Err(ForecastError::InvalidParameter(format!(
                "out-of-sample end {end} is before out-of-sample start {out_sample_start}"
            )));
        }

        Ok(Self {
            in_sample_start,
            in_sample_end,
            out_sample_start,
            out_sample_end,
        })
    }

    /// Panel rows of the in-sample period, clamped to the panel span.
    pub fn in_sample_rows(&self, panel: &Panel) -> Result<Range<usize>> {
        Ok(panel.row_range(self.in_sample_start, self.in_sample_end)?)
    }

    /// Panel rows of the out-of-sample period.
    ///
    /// Both ends must be panel months; forecasts are never produced for months
    /// outside the panel.
    pub fn out_of_sample_rows(&self, panel: &Panel) -> Result<Range<usize>> {
        let start = panel.require_position(self.out_sample_start)?;
        let end = match self.out_sample_end {
            Some(month) => panel.require_position(month)?,
            None => panel
                .len()
                .checked_sub(1)
                .ok_or_else(|| ForecastError::Empty("panel has no rows".to_string()))?,
        };
        Ok(start..end + 1)
    }

    /// First panel row that may enter an in-sample estimation window.
    pub fn first_in_sample_row(&self, panel: &Panel) -> usize {
        panel
            .dates()
            .partition_point(|d| *d < self.in_sample_start)
    }
}

/// Shape of an estimation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    /// All usable rows before the target
    Expanding,
    /// The most recent `n` usable rows before the target, or fewer if unavailable
    Rolling(usize),
}

impl Window {
    /// Select the estimation rows for a forecast at row `target`.
    ///
    /// `usable` holds the sorted indices of rows with every required value present.
    /// The returned rows all precede `target`.
    pub fn select<'a>(&self, usable: &'a [usize], target: usize) -> &'a [usize] {
        let end = usable.partition_point(|&row| row < target);
        let start = match self {
            Self::Expanding => 0,
            Self::Rolling(n) => end.saturating_sub(*n),
        };
        &usable[start..end]
    }

    /// Check the window parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Rolling(0) => Err(ForecastError::InvalidParameter(
                "rolling window must hold at least one month".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
