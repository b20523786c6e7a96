//! Dual Thrust breakout bounds.
//!
//! Over a lookback window n:
//!   HH = max(high), HC = max(close), LC = min(close), LL = min(low)
//!   range = max(HH - LC, HC - LL)
//!   upper = open + k_upper * range
//!   lower = open - k_lower * range
//! Warmup: the first (n-1) bars are NaN.

use crate::domain::indicator::rolling::{rolling_max, rolling_min};
use crate::domain::indicator::{nan_max, Args, ComputeError, IndicatorFn, IndicatorOutput};
use crate::domain::ohlcv::TableView;

pub const DEFAULT_LOOKBACK: usize = 3;
pub const DEFAULT_K_UPPER: f64 = 0.5;
pub const DEFAULT_K_LOWER: f64 = 0.3;

pub fn thrust_range(data: TableView<'_>, lookback: usize) -> Vec<f64> {
    let hh = rolling_max(&data.high(), lookback);
    let hc = rolling_max(&data.close(), lookback);
    let lc = rolling_min(&data.close(), lookback);
    let ll = rolling_min(&data.low(), lookback);

    (0..data.len())
        .map(|i| nan_max(hh[i] - lc[i], hc[i] - ll[i]))
        .collect()
}

pub fn upper_bound(data: TableView<'_>, lookback: usize, k: f64) -> Vec<f64> {
    data.open()
        .iter()
        .zip(thrust_range(data, lookback))
        .map(|(open, range)| open + k * range)
        .collect()
}

pub fn lower_bound(data: TableView<'_>, lookback: usize, k: f64) -> Vec<f64> {
    data.open()
        .iter()
        .zip(thrust_range(data, lookback))
        .map(|(open, range)| open - k * range)
        .collect()
}

/// `DT_UPPER(df, lookback, k)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperBound;

impl IndicatorFn for UpperBound {
    fn name(&self) -> String {
        "DT_UPPER".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        Ok(upper_bound(args.table(0)?, args.period(1)?, args.number(2)?).into())
    }
}

/// `DT_LOWER(df, lookback, k)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerBound;

impl IndicatorFn for LowerBound {
    fn name(&self) -> String {
        "DT_LOWER".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        Ok(lower_bound(args.table(0)?, args.period(1)?, args.number(2)?).into())
    }
}
