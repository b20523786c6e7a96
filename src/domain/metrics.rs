//! Result summary computed once from a completed ledger.

use chrono::{NaiveDateTime, TimeDelta};
use std::fmt;

use super::broker::Ledger;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub strategy_name: String,
    /// No bar was flagged insolvent.
    pub valid: bool,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration: TimeDelta,
    pub exposure_pct: f64,
    pub capital_final: f64,
    pub capital_peak: f64,
    pub return_pct: f64,
    /// Zero or negative.
    pub max_drawdown_pct: f64,
}

impl Report {
    /// `ledger` must not be empty.
    pub fn compute(ledger: &Ledger, strategy_name: &str) -> Self {
        let rows = &ledger.rows;
        let first = &rows[0];
        let last = &rows[rows.len() - 1];
        let capital = ledger.capital();

        let duration = last.timestamp - first.timestamp;
        let bars_flat = rows.iter().filter(|r| r.position == 0.0).count();

        let capital_peak = capital.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Report {
            strategy_name: strategy_name.to_string(),
            valid: ledger.insolvent_bars() == 0,
            start: first.timestamp,
            end: last.timestamp,
            duration,
            exposure_pct: exposure_pct(duration, bars_flat),
            capital_final: last.capital,
            capital_peak,
            return_pct: (last.capital - first.capital) / first.capital * 100.0,
            max_drawdown_pct: max_drawdown_pct(&capital),
        }
    }

    /// Default chart title.
    pub fn title(&self) -> &str {
        &self.strategy_name
    }
}

/// `(duration_days - bars_flat) / duration_days * 100`, 0 for spans under a day.
fn exposure_pct(duration: TimeDelta, bars_flat: usize) -> f64 {
    let days = duration.num_days();
    if days == 0 {
        return 0.0;
    }
    (days as f64 - bars_flat as f64) / days as f64 * 100.0
}

/// `-max(1 - capital / running_max(capital)) * 100`; 0 when capital never
/// falls below its running peak or no drawdown value is defined.
pub fn max_drawdown_pct(capital: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd: Option<f64> = None;

    for &c in capital {
        if c.is_nan() {
            continue;
        }
        peak = peak.max(c);
        let dd = 1.0 - c / peak;
        if dd.is_nan() {
            continue;
        }
        max_dd = Some(max_dd.map_or(dd, |m| m.max(dd)));
    }

    match max_dd {
        Some(dd) if dd != 0.0 => -dd * 100.0,
        _ => 0.0,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20}{}", "Strategy name", self.strategy_name)?;
        writeln!(f, "{:<20}{}", "Valid or not", self.valid)?;
        writeln!(f, "{:<20}{}", "(Not valid means", "(Increase cash value")?;
        writeln!(f, "{:<20}{}", "out of money)", "if false)")?;
        writeln!(f, "{:<20}{}", "Start", self.start)?;
        writeln!(f, "{:<20}{}", "End", self.end)?;
        writeln!(f, "{:<20}{} days", "Duration", self.duration.num_days())?;
        writeln!(f, "{:<20}{:.6}", "Exposure Time %", self.exposure_pct)?;
        writeln!(f, "{:<20}{:.2}", "Capital Final $", self.capital_final)?;
        writeln!(f, "{:<20}{:.2}", "Capital Peak $", self.capital_peak)?;
        writeln!(f, "{:<20}{:.6}", "Return %", self.return_pct)?;
        write!(f, "{:<20}{:.6}", "Max Drawdown %", self.max_drawdown_pct)
    }
}
