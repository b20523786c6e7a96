//! Built-in strategies.

use std::fmt;
use std::str::FromStr;

use crate::domain::action::Action;
use crate::domain::crossover::crossover;
use crate::domain::error::SteptraderError;
use crate::domain::indicator::dual_thrust::{
    LowerBound, UpperBound, DEFAULT_K_LOWER, DEFAULT_K_UPPER, DEFAULT_LOOKBACK,
};
use crate::domain::indicator::macd::{
    MacdLine, MacdSignal, DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW,
};
use crate::domain::indicator::sma::Sma;
use crate::domain::indicator::{Frame, Indicator, Input, Price};
use crate::domain::ohlcv::{PriceField, TableView};
use crate::domain::strategy::Strategy;

pub const DEFAULT_SMA_FAST: usize = 5;
pub const DEFAULT_SMA_SLOW: usize = 20;

/// Long when the fast SMA of close crosses above the slow one, short on the
/// opposite cross.
#[derive(Debug, Clone)]
pub struct SmaCross {
    pub fast: usize,
    pub slow: usize,
    fast_sma: Indicator,
    slow_sma: Indicator,
}

impl SmaCross {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self {
            fast,
            slow,
            fast_sma: Indicator::default(),
            slow_sma: Indicator::default(),
        }
    }
}

impl Default for SmaCross {
    fn default() -> Self {
        Self::new(DEFAULT_SMA_FAST, DEFAULT_SMA_SLOW)
    }
}

impl Strategy for SmaCross {
    fn set_indicators(&mut self, frame: &mut Frame<'_>) -> Result<(), SteptraderError> {
        self.fast_sma = frame.declare(&Sma, &[PriceField::Close.into(), self.fast.into()])?;
        self.slow_sma = frame.declare(&Sma, &[PriceField::Close.into(), self.slow.into()])?;
        Ok(())
    }

    fn next(&mut self, _data: TableView<'_>) -> Option<Action> {
        if crossover(&self.fast_sma, &self.slow_sma) {
            Some(Action::Long)
        } else if crossover(&self.slow_sma, &self.fast_sma) {
            Some(Action::Short)
        } else {
            None
        }
    }
}

/// Long when the MACD line crosses above its signal line, short on the
/// opposite cross.
#[derive(Debug, Clone)]
pub struct MacdCross {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    line: Indicator,
    signal_line: Indicator,
}

impl MacdCross {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast,
            slow,
            signal,
            line: Indicator::default(),
            signal_line: Indicator::default(),
        }
    }
}

impl Default for MacdCross {
    fn default() -> Self {
        Self::new(DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }
}

impl Strategy for MacdCross {
    fn set_indicators(&mut self, frame: &mut Frame<'_>) -> Result<(), SteptraderError> {
        let close = Input::from(PriceField::Close);
        self.line = frame.declare(
            &MacdLine,
            &[close.clone(), self.fast.into(), self.slow.into()],
        )?;
        self.signal_line = frame.declare(
            &MacdSignal,
            &[close, self.fast.into(), self.slow.into(), self.signal.into()],
        )?;
        Ok(())
    }

    fn next(&mut self, _data: TableView<'_>) -> Option<Action> {
        if crossover(&self.line, &self.signal_line) {
            Some(Action::Long)
        } else if crossover(&self.signal_line, &self.line) {
            Some(Action::Short)
        } else {
            None
        }
    }
}

/// Dual Thrust breakout: long when close breaks the upper bound, flatten when
/// it falls back under it, short when it breaks the lower bound.
#[derive(Debug, Clone)]
pub struct DualThrust {
    pub lookback: usize,
    pub k_upper: f64,
    pub k_lower: f64,
    upper: Indicator,
    close: Indicator,
    lower: Indicator,
}

impl DualThrust {
    pub fn new(lookback: usize, k_upper: f64, k_lower: f64) -> Self {
        Self {
            lookback,
            k_upper,
            k_lower,
            upper: Indicator::default(),
            close: Indicator::default(),
            lower: Indicator::default(),
        }
    }
}

impl Default for DualThrust {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK, DEFAULT_K_UPPER, DEFAULT_K_LOWER)
    }
}

impl Strategy for DualThrust {
    fn set_indicators(&mut self, frame: &mut Frame<'_>) -> Result<(), SteptraderError> {
        self.upper = frame.declare(
            &UpperBound,
            &[Input::Table, self.lookback.into(), self.k_upper.into()],
        )?;
        self.close = frame.declare(&Price(PriceField::Close), &[Input::Table])?;
        self.lower = frame.declare(
            &LowerBound,
            &[Input::Table, self.lookback.into(), self.k_lower.into()],
        )?;
        Ok(())
    }

    fn next(&mut self, _data: TableView<'_>) -> Option<Action> {
        if crossover(&self.close, &self.upper) {
            Some(Action::Long)
        } else if crossover(&self.upper, &self.close) {
            Some(Action::Flatten)
        } else if crossover(&self.lower, &self.close) {
            Some(Action::Short)
        } else {
            None
        }
    }
}

/// Names under which the built-in strategies are selected from config and
/// the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    SmaCross,
    MacdCross,
    DualThrust,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::SmaCross,
        StrategyKind::MacdCross,
        StrategyKind::DualThrust,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::SmaCross => "sma_cross",
            StrategyKind::MacdCross => "macd_cross",
            StrategyKind::DualThrust => "dual_thrust",
        }
    }

    /// One-line description with default parameters.
    pub fn describe(self) -> String {
        match self {
            StrategyKind::SmaCross => format!(
                "SMA({DEFAULT_SMA_FAST}) / SMA({DEFAULT_SMA_SLOW}) crossover (fast, slow)"
            ),
            StrategyKind::MacdCross => format!(
                "MACD({DEFAULT_FAST},{DEFAULT_SLOW}) / signal({DEFAULT_SIGNAL}) crossover (fast, slow, signal)"
            ),
            StrategyKind::DualThrust => format!(
                "Dual Thrust breakout, lookback {DEFAULT_LOOKBACK}, k {DEFAULT_K_UPPER}/{DEFAULT_K_LOWER} (lookback, k_upper, k_lower)"
            ),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = StrategyKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown strategy \"{s}\" (expected one of: {})", known.join(", "))
            })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::{Bar, OhlcvTable};
    use crate::domain::signal::generate_signals;
    use chrono::NaiveDate;

    fn table(rows: &[(f64, f64, f64, f64)]) -> OhlcvTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        OhlcvTable::new(
            rows.iter()
                .enumerate()
                .map(|(i, &(open, high, low, close))| Bar {
                    timestamp: start + chrono::Duration::days(i as i64),
                    open,
                    high,
                    low,
                    close,
                    volume: 1_000.0,
                })
                .collect(),
        )
        .unwrap()
    }

    fn closes(values: &[f64]) -> OhlcvTable {
        let rows: Vec<_> = values.iter().map(|&c| (c, c, c, c)).collect();
        table(&rows)
    }

    #[test]
    fn sma_cross_goes_long_then_short() {
        // fast SMA(2) crosses above SMA(3) on the rise, below on the fall
        let t = closes(&[10.0, 10.0, 10.0, 9.0, 12.0, 15.0, 15.0, 12.0, 8.0]);
        let actions = generate_signals(&mut SmaCross::new(2, 3), &t).unwrap().actions;

        assert_eq!(actions.len(), t.len());
        assert_eq!(actions[4], Some(Action::Long));
        assert!(actions.contains(&Some(Action::Short)));
        let long_at = actions.iter().position(|a| *a == Some(Action::Long));
        let short_at = actions.iter().position(|a| *a == Some(Action::Short));
        assert!(long_at < short_at);
    }

    #[test]
    fn sma_cross_retains_both_averages() {
        let t = closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let signals = generate_signals(&mut SmaCross::new(2, 3), &t).unwrap();
        let names: Vec<&str> = signals.indicators.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["SMA(c,2)", "SMA(c,3)"]);
    }

    #[test]
    fn macd_cross_declares_line_and_signal() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.5).sin() * 10.0).collect();
        let t = closes(&values);
        let signals = generate_signals(&mut MacdCross::new(3, 6, 3), &t).unwrap();
        let names: Vec<&str> = signals.indicators.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["MACD(c,3,6)", "MACD_SIG(c,3,6,3)"]);
        assert!(signals.actions.iter().any(|a| a.is_some()));
    }

    #[test]
    fn dual_thrust_breakout_goes_long() {
        let t = table(&[
            (10.0, 10.5, 9.5, 10.0),
            (10.0, 10.5, 9.5, 10.0),
            (10.0, 10.5, 9.5, 10.0),
            (10.0, 10.5, 9.5, 10.0),
            (10.0, 14.0, 9.8, 13.5),
        ]);
        let signals = generate_signals(&mut DualThrust::default(), &t).unwrap();
        assert_eq!(signals.actions[4], Some(Action::Long));
        let names: Vec<&str> = signals.indicators.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["DT_UPPER(df,3,0.5)", "close(df)", "DT_LOWER(df,3,0.3)"]);
    }

    #[test]
    fn defaults_match_names() {
        let s = SmaCross::default();
        assert_eq!((s.fast, s.slow), (5, 20));
        let m = MacdCross::default();
        assert_eq!((m.fast, m.slow, m.signal), (12, 26, 9));
        assert_eq!(DualThrust::default().lookback, 3);
        assert_eq!(s.name(), "SmaCross");
    }

    #[test]
    fn zero_period_is_an_indicator_error() {
        let t = closes(&[1.0, 2.0, 3.0]);
        let err = generate_signals(&mut SmaCross::new(0, 3), &t).unwrap_err();
        assert!(matches!(err, SteptraderError::Indicator { ref name, .. } if name == "SMA(c,0)"));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("dual_thrust".parse::<StrategyKind>().unwrap(), StrategyKind::DualThrust);
        assert!("rsi".parse::<StrategyKind>().unwrap_err().contains("sma_cross"));
        assert_eq!(StrategyKind::MacdCross.to_string(), "macd_cross");
    }
}
