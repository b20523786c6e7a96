//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, CsvLedgerWriter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::SvgChartAdapter;
use crate::domain::backtest::{Backtest, ChartStyle, RunParams};
use crate::domain::config_validation::{self, validate_config};
use crate::domain::error::SteptraderError;
use crate::domain::indicator::dual_thrust::{DEFAULT_K_LOWER, DEFAULT_K_UPPER, DEFAULT_LOOKBACK};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::metrics::Report;
use crate::domain::strategies::{
    DualThrust, MacdCross, SmaCross, StrategyKind, DEFAULT_SMA_FAST, DEFAULT_SMA_SLOW,
};
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "steptrader", about = "Walk-forward backtester for OHLCV strategies")]
pub struct Cli {
    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and print the report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// List the built-in strategies
    Strategies,
}

/// Command-line values that take precedence over the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Overrides {
    #[arg(long)]
    pub symbol: Option<String>,
    #[arg(long)]
    pub strategy: Option<String>,
    #[arg(long)]
    pub cash: Option<f64>,
    #[arg(long)]
    pub size: Option<f64>,
    #[arg(long)]
    pub commission: Option<f64>,
    #[arg(long)]
    pub trade_count: Option<f64>,
    /// Write an SVG chart here
    #[arg(long)]
    pub chart: Option<PathBuf>,
    /// line, ohlc or candle
    #[arg(long)]
    pub chart_style: Option<String>,
    /// Write the ledger as CSV here
    #[arg(long)]
    pub ledger: Option<PathBuf>,
}

/// Everything a backtest run needs, resolved from config and overrides.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub data_dir: PathBuf,
    pub symbol: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub strategy: StrategyKind,
    pub params: RunParams,
    pub chart: Option<PathBuf>,
    pub chart_style: ChartStyle,
    pub title: Option<String>,
    pub ledger: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    match cli.command {
        Command::Backtest { config, overrides } => run_backtest(&config, &overrides),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Strategies => run_strategies(),
    }
}

/// stderr subscriber; warn by default, `-v` info, `-vv` debug.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn fail(err: &SteptraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SteptraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| SteptraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    tracing::info!(path = %config_path.display(), "loading config");
    let result = load_config(config_path).and_then(|adapter| {
        validate_config(&adapter)?;
        let plan = build_plan(&adapter, overrides)?;
        let data_port = CsvAdapter::new(plan.data_dir.clone());
        run_backtest_pipeline(&data_port, &adapter, &plan)
    });

    match result {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, SteptraderError> {
    symbol_override
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| config.get_string("data", "symbol"))
        .ok_or_else(|| SteptraderError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

pub fn build_run_params(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<RunParams, SteptraderError> {
    let base = config_validation::run_params(config)?;
    let params = RunParams {
        cash: overrides.cash.unwrap_or(base.cash),
        size: overrides.size.unwrap_or(base.size),
        commission: overrides.commission.unwrap_or(base.commission),
        trade_count: overrides.trade_count.unwrap_or(base.trade_count),
    };
    params.validate()?;
    if let Some((name, value)) = config_validation::negative_cost(&params) {
        return Err(SteptraderError::InvalidParameter {
            name: name.to_string(),
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(params)
}

pub fn build_plan(config: &dyn ConfigPort, overrides: &Overrides) -> Result<RunPlan, SteptraderError> {
    let (start, end) = config_validation::date_range(config)?;
    let strategy = match overrides.strategy.as_deref() {
        Some(name) => name
            .parse::<StrategyKind>()
            .map_err(|reason| SteptraderError::InvalidParameter {
                name: "strategy".into(),
                reason,
            })?,
        None => config_validation::strategy_kind(config)?,
    };
    let chart_style = match overrides.chart_style.as_deref() {
        Some(style) => style.parse::<ChartStyle>()?,
        None => config_validation::chart_style(config)?,
    };

    Ok(RunPlan {
        data_dir: config
            .get_string("data", "directory")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        symbol: resolve_symbol(overrides.symbol.as_deref(), config)?,
        start,
        end,
        strategy,
        params: build_run_params(config, overrides)?,
        chart: overrides
            .chart
            .clone()
            .or_else(|| config.get_string("report", "chart").map(PathBuf::from)),
        chart_style,
        title: config.get_string("report", "title"),
        ledger: overrides
            .ledger
            .clone()
            .or_else(|| config.get_string("report", "ledger").map(PathBuf::from)),
    })
}

/// Built-in strategy `kind` with its `[strategy]` parameters over the defaults.
pub fn build_strategy(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<Box<dyn Strategy>, SteptraderError> {
    let period = |key: &str, default: usize| -> Result<usize, SteptraderError> {
        Ok(config_validation::period(config, key)?.unwrap_or(default))
    };
    let coefficient = |key: &str, default: f64| -> Result<f64, SteptraderError> {
        Ok(config_validation::coefficient(config, key)?.unwrap_or(default))
    };

    Ok(match kind {
        StrategyKind::SmaCross => Box::new(SmaCross::new(
            period("fast", DEFAULT_SMA_FAST)?,
            period("slow", DEFAULT_SMA_SLOW)?,
        )),
        StrategyKind::MacdCross => Box::new(MacdCross::new(
            period("fast", DEFAULT_FAST)?,
            period("slow", DEFAULT_SLOW)?,
            period("signal", DEFAULT_SIGNAL)?,
        )),
        StrategyKind::DualThrust => Box::new(DualThrust::new(
            period("lookback", DEFAULT_LOOKBACK)?,
            coefficient("k_upper", DEFAULT_K_UPPER)?,
            coefficient("k_lower", DEFAULT_K_LOWER)?,
        )),
    })
}

/// Load, run, and write the optional chart and ledger outputs.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    plan: &RunPlan,
) -> Result<Report, SteptraderError> {
    let table = data_port.fetch_ohlcv(&plan.symbol, plan.start, plan.end)?;
    tracing::info!(
        symbol = %plan.symbol,
        bars = table.len(),
        first = %table.first().timestamp,
        last = %table.last().timestamp,
        "data loaded"
    );

    let strategy = build_strategy(config, plan.strategy)?;
    let mut backtest = Backtest::new(strategy, table);
    let report = backtest.run(plan.params)?.clone();

    if plan.chart.is_some() || plan.ledger.is_some() {
        let chart = backtest.chart(plan.title.as_deref(), plan.chart_style)?;
        if let Some(path) = &plan.chart {
            SvgChartAdapter::new(backtest.table().bars()).write(&chart, path)?;
            eprintln!("Chart written to: {}", path.display());
        }
        if let Some(path) = &plan.ledger {
            CsvLedgerWriter.write(&chart, path)?;
            eprintln!("Ledger written to: {}", path.display());
        }
    }

    Ok(report)
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let result = load_config(config_path).and_then(|adapter| {
        validate_config(&adapter)?;
        let symbol = resolve_symbol(None, &adapter)?;
        let kind = config_validation::strategy_kind(&adapter)?;
        Ok((symbol, kind))
    });

    match result {
        Ok((symbol, kind)) => {
            eprintln!("  symbol:   {symbol}");
            eprintln!("  strategy: {kind}");
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let result = load_config(config_path).and_then(|adapter| {
        validate_config(&adapter)?;
        let symbol = resolve_symbol(symbol, &adapter)?;
        let (start, end) = config_validation::date_range(&adapter)?;
        let dir = adapter
            .get_string("data", "directory")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let table = CsvAdapter::new(PathBuf::from(dir)).fetch_ohlcv(&symbol, start, end)?;
        Ok((symbol, table))
    });

    match result {
        Ok((symbol, table)) => {
            println!(
                "{}: {} bars, {} to {}",
                symbol,
                table.len(),
                table.first().timestamp,
                table.last().timestamp
            );
            if table.was_sorted() {
                println!("{symbol}: input was not in ascending order and has been sorted");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_strategies() -> ExitCode {
    for kind in StrategyKind::ALL {
        println!("{:<12} {}", kind.as_str(), kind.describe());
    }
    ExitCode::SUCCESS
}
