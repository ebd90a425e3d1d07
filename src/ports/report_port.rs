//! Report generation port trait.

use crate::domain::error::ScannerError;
use crate::domain::scan::ScanReport;

/// Port for writing scan reports.
pub trait ReportPort {
    fn write(&self, report: &ScanReport, output_path: &str) -> Result<(), ScannerError>;
}
