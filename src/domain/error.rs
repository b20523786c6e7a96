//! Domain error types.

/// Top-level error type for steptrader.
#[derive(Debug, thiserror::Error)]
pub enum SteptraderError {
    #[error("invalid OHLCV table: {reason}")]
    InvalidTable { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("indicator \"{name}\" errored with exception: {reason}")]
    Indicator { name: String, reason: String },

    #[error(
        "indicators must return arrays of the same length as data \
         (data shape: {expected}; indicator \"{name}\" shape: {actual})"
    )]
    IndicatorShape {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("signal sequence has {actual} entries, table has {expected} bars")]
    SignalLength { expected: usize, actual: usize },

    #[error("run() has to be executed before the chart is rendered")]
    NotRun,

    #[error("chart style must be one of 'line', 'ohlc' or 'candle', got '{style}'")]
    InvalidChartStyle { style: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SteptraderError> for std::process::ExitCode {
    fn from(err: &SteptraderError) -> Self {
        let code: u8 = match err {
            SteptraderError::Io(_) => 1,
            SteptraderError::ConfigParse { .. }
            | SteptraderError::ConfigMissing { .. }
            | SteptraderError::ConfigInvalid { .. } => 2,
            SteptraderError::InvalidTable { .. }
            | SteptraderError::Data { .. }
            | SteptraderError::NoData { .. } => 3,
            SteptraderError::Indicator { .. } | SteptraderError::IndicatorShape { .. } => 4,
            SteptraderError::InvalidParameter { .. } | SteptraderError::SignalLength { .. } => 5,
            SteptraderError::NotRun | SteptraderError::InvalidChartStyle { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_error_names_indicator_and_cause() {
        let err = SteptraderError::Indicator {
            name: "SMA(c,5)".into(),
            reason: "period must be positive".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SMA(c,5)"));
        assert!(msg.contains("period must be positive"));
    }

    #[test]
    fn shape_error_reports_both_shapes() {
        let err = SteptraderError::IndicatorShape {
            name: "short".into(),
            expected: "(4,)".into(),
            actual: "(3,)".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("(4,)"));
        assert!(msg.contains("(3,)"));
    }

    #[test]
    fn exit_codes_group_by_kind() {
        use std::process::ExitCode;

        let config = SteptraderError::ConfigMissing {
            section: "backtest".into(),
            key: "cash".into(),
        };
        assert_eq!(
            format!("{:?}", ExitCode::from(&config)),
            format!("{:?}", ExitCode::from(2))
        );
        assert_eq!(
            format!("{:?}", ExitCode::from(&SteptraderError::NotRun)),
            format!("{:?}", ExitCode::from(6))
        );
        let param = SteptraderError::InvalidParameter {
            name: "cash".into(),
            reason: "must be a number".into(),
        };
        assert_eq!(
            format!("{:?}", ExitCode::from(&param)),
            format!("{:?}", ExitCode::from(5))
        );
    }
}
