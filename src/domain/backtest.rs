//! Backtest run: parameters, the run itself, and access to its results.

use std::fmt;
use std::str::FromStr;

use crate::domain::broker::{settle, Ledger};
use crate::domain::error::SteptraderError;
use crate::domain::metrics::Report;
use crate::domain::ohlcv::OhlcvTable;
use crate::domain::signal::generate_signals;
use crate::domain::strategy::Strategy;

pub const DEFAULT_CASH: f64 = 50_000.0;
pub const DEFAULT_SIZE: f64 = 100.0;
pub const DEFAULT_COMMISSION: f64 = 0.0;
pub const DEFAULT_TRADE_COUNT: f64 = 1.0;

/// Broker parameters for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    /// Starting cash.
    pub cash: f64,
    /// Units traded per decision.
    pub size: f64,
    /// Commission rate charged on position changes.
    pub commission: f64,
    /// Transactions per decision.
    pub trade_count: f64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            cash: DEFAULT_CASH,
            size: DEFAULT_SIZE,
            commission: DEFAULT_COMMISSION,
            trade_count: DEFAULT_TRADE_COUNT,
        }
    }
}

impl RunParams {
    pub fn validate(&self) -> Result<(), SteptraderError> {
        for (name, value) in [
            ("cash", self.cash),
            ("size", self.size),
            ("commission", self.commission),
            ("trade_count", self.trade_count),
        ] {
            if !value.is_finite() {
                return Err(SteptraderError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be a finite number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    Line,
    Ohlc,
    #[default]
    Candle,
}

impl FromStr for ChartStyle {
    type Err = SteptraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(ChartStyle::Line),
            "ohlc" => Ok(ChartStyle::Ohlc),
            "candle" => Ok(ChartStyle::Candle),
            other => Err(SteptraderError::InvalidChartStyle {
                style: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartStyle::Line => "line",
            ChartStyle::Ohlc => "ohlc",
            ChartStyle::Candle => "candle",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ledger: Ledger,
    pub report: Report,
}

/// Everything a chart renderer needs. Only obtainable after a run.
#[derive(Debug, Clone, Copy)]
pub struct ChartData<'a> {
    pub title: &'a str,
    pub style: ChartStyle,
    pub ledger: &'a Ledger,
    pub report: &'a Report,
}

pub struct Backtest<S: Strategy> {
    strategy: S,
    table: OhlcvTable,
    result: Option<BacktestResult>,
}

impl<S: Strategy> Backtest<S> {
    pub fn new(strategy: S, table: OhlcvTable) -> Self {
        Self {
            strategy,
            table,
            result: None,
        }
    }

    pub fn table(&self) -> &OhlcvTable {
        &self.table
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Replays the table, settles the ledger and summarises it. A later run
    /// replaces the previous result.
    pub fn run(&mut self, params: RunParams) -> Result<&Report, SteptraderError> {
        params.validate()?;
        let name = self.strategy.name();
        tracing::info!(strategy = %name, bars = self.table.len(), "running backtest");

        let signals = generate_signals(&mut self.strategy, &self.table)?;
        let ledger = settle(&self.table, &signals.actions, signals.indicators, &params)?;
        let report = Report::compute(&ledger, &name);

        tracing::info!(
            strategy = %name,
            capital = report.capital_final,
            return_pct = report.return_pct,
            valid = report.valid,
            "backtest complete"
        );

        let result = self.result.insert(BacktestResult { ledger, report });
        Ok(&result.report)
    }

    pub fn result(&self) -> Option<&BacktestResult> {
        self.result.as_ref()
    }

    /// Chart payload for the last run. `title` defaults to the strategy name.
    pub fn chart<'a>(
        &'a self,
        title: Option<&'a str>,
        style: ChartStyle,
    ) -> Result<ChartData<'a>, SteptraderError> {
        let result = self.result.as_ref().ok_or(SteptraderError::NotRun)?;
        Ok(ChartData {
            title: title.unwrap_or_else(|| result.report.title()),
            style,
            ledger: &result.ledger,
            report: &result.report,
        })
    }
}
