//! Position and P&L accounting.
//!
//! Turns the per-bar action sequence into a ledger:
//!   position[t]  = last defined action at or before t-1 (0 before any)
//!   change[t]    = close[t] - close[t-1]
//!   trading[t]   = change[t] * position[t] * size
//!   fee[t]       = close[t] * size * trade_count * commission * |position[t] - position[t-1]|
//!   net[t]       = trading[t] - fee[t], 0 where undefined
//!   capital[t]   = cash + sum(net[0..=t])
//!   insolvent[t] = fee[t] != 0 && capital[t-1] <= close[t] * size * trade_count + fee[t]

use chrono::NaiveDateTime;

use crate::domain::action::Action;
use crate::domain::backtest::RunParams;
use crate::domain::error::SteptraderError;
use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvTable;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub signal: Option<Action>,
    /// `None` on the first bar.
    pub price_change: Option<f64>,
    pub position: f64,
    /// `None` on the first bar.
    pub trading_pnl: Option<f64>,
    pub fee: f64,
    pub net_pnl: f64,
    pub cumulative_pnl: f64,
    pub capital: f64,
    pub insolvent: bool,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    pub rows: Vec<LedgerRow>,
    /// Indicators retained for display, in declaration order.
    pub indicators: Vec<Indicator>,
}

impl Ledger {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.position).collect()
    }

    pub fn capital(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.capital).collect()
    }

    pub fn net_pnl(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.net_pnl).collect()
    }

    pub fn cumulative_pnl(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cumulative_pnl).collect()
    }

    pub fn fees(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.fee).collect()
    }

    pub fn insolvent_bars(&self) -> usize {
        self.rows.iter().filter(|r| r.insolvent).count()
    }
}

/// Forward-filled actions, lagged one bar, 0 before the first action.
pub fn positions(actions: &[Option<Action>]) -> Vec<f64> {
    let mut held = 0.0;
    actions
        .iter()
        .map(|action| {
            let position = held;
            if let Some(a) = action {
                held = a.position();
            }
            position
        })
        .collect()
}

pub fn settle(
    table: &OhlcvTable,
    actions: &[Option<Action>],
    indicators: Vec<Indicator>,
    params: &RunParams,
) -> Result<Ledger, SteptraderError> {
    params.validate()?;
    if actions.len() != table.len() {
        return Err(SteptraderError::SignalLength {
            expected: table.len(),
            actual: actions.len(),
        });
    }

    let positions = positions(actions);
    let mut rows: Vec<LedgerRow> = Vec::with_capacity(table.len());
    let mut cumulative = 0.0;

    for (t, bar) in table.bars().iter().enumerate() {
        let position = positions[t];
        let (price_change, position_delta, prev_capital) = match t {
            0 => (None, 0.0, None),
            _ => (
                Some(bar.close - table.bars()[t - 1].close),
                (position - positions[t - 1]).abs(),
                Some(rows[t - 1].capital),
            ),
        };

        let trading_pnl = price_change.map(|change| change * position * params.size);
        let fee = bar.close * params.size * params.trade_count * params.commission * position_delta;
        let net_pnl = trading_pnl.map_or(0.0, |pnl| pnl - fee);
        let net_pnl = if net_pnl.is_nan() { 0.0 } else { net_pnl };
        cumulative += net_pnl;
        let capital = params.cash + cumulative;

        let exposure = bar.close * params.size * params.trade_count + fee;
        let insolvent = fee != 0.0 && prev_capital.is_some_and(|c| c <= exposure);

        rows.push(LedgerRow {
            timestamp: bar.timestamp,
            close: bar.close,
            signal: actions[t],
            price_change,
            position,
            trading_pnl,
            fee,
            net_pnl,
            cumulative_pnl: cumulative,
            capital,
            insolvent,
        });
    }

    Ok(Ledger { rows, indicators })
}
