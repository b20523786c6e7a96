//! Configuration validation.
//!
//! Validates all config fields before any data is loaded. The typed readers
//! here are also what the CLI uses to build run inputs, so a value that
//! passes validation is read the same way when the run starts.

use crate::domain::backtest::{ChartStyle, RunParams};
use crate::domain::error::SteptraderError;
use crate::domain::strategies::StrategyKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SteptraderError> {
    validate_backtest_config(config)?;
    validate_data_config(config)?;
    validate_strategy_config(config)?;
    validate_report_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SteptraderError> {
    run_params(config).map(|_| ())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SteptraderError> {
    date_range(config).map(|_| ())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SteptraderError> {
    let kind = strategy_kind(config)?;
    match kind {
        StrategyKind::SmaCross => {
            period(config, "fast")?;
            period(config, "slow")?;
        }
        StrategyKind::MacdCross => {
            period(config, "fast")?;
            period(config, "slow")?;
            period(config, "signal")?;
        }
        StrategyKind::DualThrust => {
            period(config, "lookback")?;
            finite(config, "strategy", "k_upper")?;
            finite(config, "strategy", "k_lower")?;
        }
    }
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), SteptraderError> {
    chart_style(config).map(|_| ())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SteptraderError {
    SteptraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn finite(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, SteptraderError> {
    match config.get_double(section, key)? {
        Some(v) if !v.is_finite() => Err(invalid(section, key, format!("{key} must be finite"))),
        other => Ok(other),
    }
}

/// `[backtest]` values over the defaults.
pub fn run_params(config: &dyn ConfigPort) -> Result<RunParams, SteptraderError> {
    let defaults = RunParams::default();
    let params = RunParams {
        cash: finite(config, "backtest", "cash")?.unwrap_or(defaults.cash),
        size: finite(config, "backtest", "size")?.unwrap_or(defaults.size),
        commission: finite(config, "backtest", "commission")?.unwrap_or(defaults.commission),
        trade_count: finite(config, "backtest", "trade_count")?.unwrap_or(defaults.trade_count),
    };

    if let Some((key, _)) = negative_cost(&params) {
        return Err(invalid("backtest", key, format!("{key} must be non-negative")));
    }
    Ok(params)
}

/// First cost parameter below zero, with its value.
pub fn negative_cost(params: &RunParams) -> Option<(&'static str, f64)> {
    [("commission", params.commission), ("trade_count", params.trade_count)]
        .into_iter()
        .find(|&(_, value)| value < 0.0)
}

/// Optional `[data] start_date` / `end_date`, inclusive.
pub fn date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), SteptraderError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid("data", "start_date", "start_date must not be after end_date"));
        }
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, SteptraderError> {
    config
        .get_string("data", key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                invalid(
                    "data",
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            })
        })
        .transpose()
}

/// `[strategy] name`, defaulting to `sma_cross`.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, SteptraderError> {
    match config.get_string("strategy", "name") {
        None => Ok(StrategyKind::SmaCross),
        Some(name) => name
            .parse::<StrategyKind>()
            .map_err(|reason| invalid("strategy", "name", reason)),
    }
}

/// Optional positive integer under `[strategy]`.
pub fn period(config: &dyn ConfigPort, key: &str) -> Result<Option<usize>, SteptraderError> {
    match config.get_int("strategy", key)? {
        None => Ok(None),
        Some(v) if v >= 1 => Ok(Some(v as usize)),
        Some(_) => Err(invalid("strategy", key, format!("{key} must be at least 1"))),
    }
}

/// Optional finite number under `[strategy]`.
pub fn coefficient(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, SteptraderError> {
    finite(config, "strategy", key)
}

/// `[report] chart_style`, defaulting to candle.
pub fn chart_style(config: &dyn ConfigPort) -> Result<ChartStyle, SteptraderError> {
    match config.get_string("report", "chart_style") {
        None => Ok(ChartStyle::default()),
        Some(style) => style
            .parse::<ChartStyle>()
            .map_err(|e| invalid("report", "chart_style", e.to_string())),
    }
}
