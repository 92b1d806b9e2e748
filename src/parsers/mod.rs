pub mod clover;
pub mod xml;

use crate::error::Result;
use crate::model::CoverageData;

/// Every report format parser implements this trait.
pub trait ReportParser {
    /// Parse the report text into our uniform coverage model.
    fn parse(&self, input: &str) -> Result<CoverageData>;
}
