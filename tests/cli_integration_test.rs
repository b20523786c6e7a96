//! CLI integration tests for the backtest command orchestration.
//!
//! Tests cover:
//! - Config loading from INI files on disk
//! - Run plan resolution (config values, overrides, defaults)
//! - Strategy construction from `[strategy]` parameters
//! - Full pipeline over CSV files with chart and ledger output

mod common;

use common::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use steptrader::adapters::csv_adapter::CsvAdapter;
use steptrader::adapters::file_config_adapter::FileConfigAdapter;
use steptrader::cli::{self, Overrides};
use steptrader::domain::backtest::{ChartStyle, RunParams};
use steptrader::domain::error::SteptraderError;
use steptrader::domain::strategies::StrategyKind;
use steptrader::domain::strategy::Strategy;
use steptrader::ports::data_port::DataPort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

const VALID_INI: &str = r#"
[backtest]
cash = 25000
size = 5
commission = 0.002
trade_count = 1

[data]
directory = market
symbol = GOOG
start_date = 2021-09-03
end_date = 2021-12-31

[strategy]
name = dual_thrust
lookback = 4
k_upper = 0.6
k_lower = 0.2

[report]
chart = out/goog.svg
chart_style = ohlc
title = Breakout
"#;

mod config_loading {
    use super::*;

    #[test]
    fn loads_ini_from_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let plan = cli::build_plan(&adapter, &Overrides::default()).unwrap();
        assert_eq!(plan.symbol, "GOOG");
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/steptrader.ini")).unwrap_err();
        assert!(matches!(err, SteptraderError::ConfigParse { ref file, .. } if file.contains("steptrader.ini")));
    }
}

mod plan_resolution {
    use super::*;

    #[test]
    fn reads_every_section() {
        let plan = cli::build_plan(&config(VALID_INI), &Overrides::default()).unwrap();

        assert_eq!(plan.data_dir, PathBuf::from("market"));
        assert_eq!(plan.start, Some(date(2021, 9, 3)));
        assert_eq!(plan.end, Some(date(2021, 12, 31)));
        assert_eq!(plan.strategy, StrategyKind::DualThrust);
        assert_eq!(
            plan.params,
            RunParams {
                cash: 25_000.0,
                size: 5.0,
                commission: 0.002,
                trade_count: 1.0,
            }
        );
        assert_eq!(plan.chart, Some(PathBuf::from("out/goog.svg")));
        assert_eq!(plan.chart_style, ChartStyle::Ohlc);
        assert_eq!(plan.title.as_deref(), Some("Breakout"));
        assert_eq!(plan.ledger, None);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let plan = cli::build_plan(&config("[data]\nsymbol = BHP\n"), &Overrides::default()).unwrap();

        assert_eq!(plan.data_dir, PathBuf::from("data"));
        assert_eq!(plan.strategy, StrategyKind::SmaCross);
        assert_eq!(plan.params, RunParams::default());
        assert_eq!(plan.chart_style, ChartStyle::Candle);
        assert_eq!((plan.start, plan.end), (None, None));
        assert!(plan.chart.is_none() && plan.title.is_none());
    }

    #[test]
    fn overrides_take_precedence() {
        let overrides = Overrides {
            symbol: Some("CBA".into()),
            strategy: Some("macd_cross".into()),
            cash: Some(1_000.0),
            commission: Some(0.0),
            chart_style: Some("line".into()),
            ledger: Some(PathBuf::from("ledger.csv")),
            ..Overrides::default()
        };
        let plan = cli::build_plan(&config(VALID_INI), &overrides).unwrap();

        assert_eq!(plan.symbol, "CBA");
        assert_eq!(plan.strategy, StrategyKind::MacdCross);
        assert_eq!(plan.params.cash, 1_000.0);
        assert_eq!(plan.params.commission, 0.0);
        assert_eq!(plan.params.size, 5.0);
        assert_eq!(plan.chart_style, ChartStyle::Line);
        assert_eq!(plan.ledger, Some(PathBuf::from("ledger.csv")));
    }

    #[test]
    fn missing_symbol_is_reported() {
        let err = cli::build_plan(&config("[backtest]\ncash = 10\n"), &Overrides::default()).unwrap_err();
        assert!(matches!(
            err,
            SteptraderError::ConfigMissing { ref section, ref key } if section == "data" && key == "symbol"
        ));
    }

    #[test]
    fn blank_symbol_override_falls_back_to_config() {
        let adapter = config(VALID_INI);
        assert_eq!(cli::resolve_symbol(Some("  "), &adapter).unwrap(), "GOOG");
        assert_eq!(cli::resolve_symbol(Some(" BHP "), &adapter).unwrap(), "BHP");
    }

    #[test]
    fn unknown_strategy_override_is_invalid_parameter() {
        let overrides = Overrides {
            strategy: Some("turtle".into()),
            ..Overrides::default()
        };
        let err = cli::build_plan(&config(VALID_INI), &overrides).unwrap_err();
        match err {
            SteptraderError::InvalidParameter { name, reason } => {
                assert_eq!(name, "strategy");
                assert!(reason.contains("sma_cross"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_chart_style_override_is_rejected() {
        let overrides = Overrides {
            chart_style: Some("bars".into()),
            ..Overrides::default()
        };
        let err = cli::build_plan(&config(VALID_INI), &overrides).unwrap_err();
        assert!(matches!(err, SteptraderError::InvalidChartStyle { ref style } if style == "bars"));
    }

    #[test]
    fn non_finite_cash_override_is_rejected() {
        let overrides = Overrides {
            cash: Some(f64::NAN),
            ..Overrides::default()
        };
        let err = cli::build_run_params(&config(VALID_INI), &overrides).unwrap_err();
        assert!(matches!(err, SteptraderError::InvalidParameter { ref name, .. } if name == "cash"));
    }

    #[test]
    fn negative_cost_overrides_are_rejected() {
        let overrides = Overrides {
            commission: Some(-0.1),
            trade_count: Some(-3.0),
            ..Overrides::default()
        };
        let err = cli::build_run_params(&config(VALID_INI), &overrides).unwrap_err();
        assert!(matches!(err, SteptraderError::InvalidParameter { ref name, .. } if name == "commission"));

        let overrides = Overrides {
            trade_count: Some(-3.0),
            ..Overrides::default()
        };
        let err = cli::build_plan(&config(VALID_INI), &overrides).unwrap_err();
        assert!(matches!(err, SteptraderError::InvalidParameter { ref name, .. } if name == "trade_count"));
    }

    #[test]
    fn invalid_config_value_surfaces() {
        let err = cli::build_run_params(&config("[backtest]\nsize = many\n"), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, SteptraderError::ConfigInvalid { ref key, .. } if key == "size"));
    }
}

mod strategy_construction {
    use super::*;

    #[test]
    fn builds_each_kind() {
        let adapter = config("");
        for kind in StrategyKind::ALL {
            let strategy = cli::build_strategy(&adapter, kind).unwrap();
            let expected = match kind {
                StrategyKind::SmaCross => "SmaCross",
                StrategyKind::MacdCross => "MacdCross",
                StrategyKind::DualThrust => "DualThrust",
            };
            assert_eq!(strategy.name(), expected);
        }
    }

    #[test]
    fn strategy_parameters_reach_indicator_names() {
        let adapter = config("[strategy]\nfast = 2\nslow = 3\n");
        let mut strategy = cli::build_strategy(&adapter, StrategyKind::SmaCross).unwrap();
        let table = table_from_closes(&wave_closes(12));
        let signals =
            steptrader::domain::signal::generate_signals(&mut strategy, &table).unwrap();
        let names: Vec<&str> = signals.indicators.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["SMA(c,2)", "SMA(c,3)"]);
    }

    #[test]
    fn zero_period_is_rejected() {
        let adapter = config("[strategy]\nlookback = 0\n");
        let err = cli::build_strategy(&adapter, StrategyKind::DualThrust)
            .err()
            .unwrap();
        assert!(matches!(err, SteptraderError::ConfigInvalid { ref key, .. } if key == "lookback"));
    }
}

mod csv_pipeline {
    use super::*;

    fn write_symbol_csv(dir: &Path, symbol: &str, closes: &[f64]) {
        let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
        for bar in bars_from_closes(closes) {
            content.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.timestamp.format("%Y-%m-%d"),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            ));
        }
        fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
    }

    #[test]
    fn writes_chart_and_ledger() {
        let dir = tempfile::TempDir::new().unwrap();
        write_symbol_csv(dir.path(), "WAVE", &wave_closes(60));

        let ini = format!(
            "[data]\ndirectory = {}\nsymbol = WAVE\n\n[strategy]\nname = sma_cross\nfast = 3\nslow = 7\n",
            dir.path().display()
        );
        let adapter = config(&ini);
        let overrides = Overrides {
            chart: Some(dir.path().join("charts/wave.svg")),
            ledger: Some(dir.path().join("wave_ledger.csv")),
            chart_style: Some("candle".into()),
            ..Overrides::default()
        };
        let plan = cli::build_plan(&adapter, &overrides).unwrap();
        let data_port = CsvAdapter::new(plan.data_dir.clone());

        let report = cli::run_backtest_pipeline(&data_port, &adapter, &plan).unwrap();
        assert_eq!(report.strategy_name, "SmaCross");
        assert_eq!(report.start, day(0));
        assert_eq!(report.end, day(59));

        let svg = fs::read_to_string(dir.path().join("charts/wave.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("SmaCross"));

        let ledger = fs::read_to_string(dir.path().join("wave_ledger.csv")).unwrap();
        let mut lines = ledger.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("timestamp,close,signal,price_change,position"));
        assert!(header.ends_with(r#""SMA(c,3)","SMA(c,7)""#));
        assert_eq!(lines.count(), 60);
    }

    #[test]
    fn date_range_narrows_loaded_bars() {
        let dir = tempfile::TempDir::new().unwrap();
        write_symbol_csv(dir.path(), "WAVE", &wave_closes(30));

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let table = adapter
            .fetch_ohlcv("WAVE", Some(date(2024, 1, 5)), Some(date(2024, 1, 14)))
            .unwrap();
        assert_eq!(table.len(), 10);
        assert_eq!(table.first().timestamp, day(4));
        assert_eq!(adapter.list_symbols().unwrap(), vec!["WAVE".to_string()]);
    }

    #[test]
    fn missing_csv_is_no_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let adapter = config(&format!(
            "[data]\ndirectory = {}\nsymbol = NONE\n",
            dir.path().display()
        ));
        let plan = cli::build_plan(&adapter, &Overrides::default()).unwrap();
        let data_port = CsvAdapter::new(plan.data_dir.clone());

        let err = cli::run_backtest_pipeline(&data_port, &adapter, &plan).unwrap_err();
        assert!(matches!(err, SteptraderError::NoData { ref symbol } if symbol == "NONE"));
    }
}
