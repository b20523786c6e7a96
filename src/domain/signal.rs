//! Walk-forward signal generation.
//!
//! For each bar i >= 2 the strategy re-declares every indicator against bars
//! [0, i] only, then decides. Indicators are never computed on the full table
//! and sliced, so no future bar reaches a decision.

use crate::domain::action::Action;
use crate::domain::error::SteptraderError;
use crate::domain::indicator::{Frame, Indicator, IndicatorRegistry};
use crate::domain::ohlcv::OhlcvTable;
use crate::domain::strategy::Strategy;

/// Leading bars that never carry a decision.
pub const WARMUP_BARS: usize = 2;

#[derive(Debug, Clone)]
pub struct Signals {
    /// One entry per bar; the first `WARMUP_BARS` are always `None`.
    pub actions: Vec<Option<Action>>,
    /// Indicators from the final, full-length step.
    pub indicators: Vec<Indicator>,
}

pub fn generate_signals<S>(strategy: &mut S, table: &OhlcvTable) -> Result<Signals, SteptraderError>
where
    S: Strategy + ?Sized,
{
    let mut registry = IndicatorRegistry::new(table.len());
    let mut actions: Vec<Option<Action>> = vec![None; WARMUP_BARS.min(table.len())];

    for i in WARMUP_BARS..table.len() {
        let view = table.prefix(i + 1);
        let mut frame = Frame::new(view, &mut registry);
        strategy.set_indicators(&mut frame)?;
        let action = strategy.next(view);
        if let Some(a) = action {
            tracing::debug!(bar = i, action = %a, "signal");
        }
        actions.push(action);
    }

    Ok(Signals {
        actions,
        indicators: registry.into_indicators(),
    })
}
