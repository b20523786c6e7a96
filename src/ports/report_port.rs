//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::ChartData;
use crate::domain::error::SteptraderError;

/// Port for writing the result of a completed run.
pub trait ReportPort {
    fn write(&self, chart: &ChartData<'_>, output_path: &Path) -> Result<(), SteptraderError>;
}
