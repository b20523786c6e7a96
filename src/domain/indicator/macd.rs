//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! Warmup: the line is NaN for the first slow-1 bars, the signal for a further
//! signal-1 bars.

use crate::domain::indicator::ema::ema;
use crate::domain::indicator::{Args, ComputeError, IndicatorFn, IndicatorOutput};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn macd_line(values: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast = ema(values, fast);
    let slow = ema(values, slow);
    fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
}

pub fn macd_signal(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<f64> {
    ema(&macd_line(values, fast, slow), signal)
}

pub fn macd_histogram(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<f64> {
    let line = macd_line(values, fast, slow);
    let signal = ema(&line, signal);
    line.iter().zip(&signal).map(|(l, s)| l - s).collect()
}

fn periods(args: &Args<'_>, count: usize) -> Result<Vec<usize>, ComputeError> {
    (1..=count).map(|i| args.period(i)).collect()
}

/// `MACD(series, fast, slow)`: the MACD line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdLine;

impl IndicatorFn for MacdLine {
    fn name(&self) -> String {
        "MACD".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        let values = args.series(0)?;
        let p = periods(args, 2)?;
        Ok(macd_line(values, p[0], p[1]).into())
    }
}

/// `MACD_SIG(series, fast, slow, signal)`: the signal line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdSignal;

impl IndicatorFn for MacdSignal {
    fn name(&self) -> String {
        "MACD_SIG".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        let values = args.series(0)?;
        let p = periods(args, 3)?;
        Ok(macd_signal(values, p[0], p[1], p[2]).into())
    }
}

/// `MACD_ALL(series, fast, slow, signal)`: line, signal and histogram as
/// three lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Macd;

impl IndicatorFn for Macd {
    fn name(&self) -> String {
        "MACD_ALL".to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        let values = args.series(0)?;
        let p = periods(args, 3)?;
        let line = macd_line(values, p[0], p[1]);
        let signal = ema(&line, p[2]);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
        Ok(vec![line, signal, histogram].into())
    }
}
