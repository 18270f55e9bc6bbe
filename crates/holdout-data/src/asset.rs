//! The two risky assets of the pipeline.

use crate::panel::columns;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset class whose excess return is forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// S&P 500 equity index
    Stocks,
    /// US aggregate bond index
    Bonds,
}

impl Asset {
    /// Both assets in portfolio order.
    pub const ALL: [Self; 2] = [Self::Stocks, Self::Bonds];

    /// Panel column holding this asset's monthly excess return.
    pub const fn excess_return_column(&self) -> &'static str {
        match self {
            Self::Stocks => columns::EXCESS_RETURN_STOCKS,
            Self::Bonds => columns::EXCESS_RETURN_BONDS,
        }
    }

    /// Short label used in tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Stocks => "Stocks",
            Self::Bonds => "Bonds",
        }
    }

    /// Display name of the underlying index.
    pub const fn index_name(&self) -> &'static str {
        match self {
            Self::Stocks => "S&P 500",
            Self::Bonds => "Bonds",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
