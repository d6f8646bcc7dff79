//! Scan report output port trait.

use crate::domain::error::FlowbandError;
use crate::domain::scanner::ScanReport;
use std::path::Path;

/// Port for writing scan reports.
pub trait ReportPort {
    fn write(&self, report: &ScanReport, output_path: &Path) -> Result<(), FlowbandError>;

    /// Conventional file extension for this format.
    fn extension(&self) -> &'static str;
}
