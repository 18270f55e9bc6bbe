#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/holdout/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod asset;
pub mod error;
pub mod merge;
pub mod month;
pub mod panel;
pub mod stats;

pub use asset::Asset;
pub use error::{DataError, Result};
pub use merge::{PanelBuilder, SourceFile, SourceFrames};
pub use month::Month;
pub use panel::{Panel, columns};
pub use stats::{AssetStatistics, AssetSummary, PERIODS_PER_YEAR};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
