//! Data access port trait.

use crate::domain::error::SteptraderError;
use crate::domain::ohlcv::OhlcvTable;
use chrono::NaiveDate;

pub trait DataPort {
    /// Validated table for `symbol`, restricted to `[start, end]` when given.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OhlcvTable, SteptraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SteptraderError>;
}
