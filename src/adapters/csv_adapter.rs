//! CSV file data adapter and ledger export.

use crate::domain::backtest::ChartData;
use crate::domain::error::SteptraderError;
use crate::domain::ohlcv::{Bar, OhlcvTable};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads `<base_path>/<symbol>.csv`.
pub struct CsvAdapter {
    base_path: PathBuf,
}

/// One CSV row. Header names are matched case-insensitively; extra columns
/// are ignored and empty cells become missing values.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "timestamp", alias = "datetime")]
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

/// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339 (converted to UTC).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

fn data_error(reason: String) -> SteptraderError {
    SteptraderError::Data { reason }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OhlcvTable, SteptraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SteptraderError::NoData {
                symbol: symbol.to_string(),
            },
            _ => data_error(format!("failed to read {}: {}", path.display(), e)),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV header error in {}: {}", path.display(), e)))?
            .iter()
            .map(str::to_lowercase)
            .collect::<csv::StringRecord>();
        rdr.set_headers(headers);

        let mut bars = Vec::new();
        for result in rdr.deserialize::<CsvRow>() {
            let row =
                result.map_err(|e| data_error(format!("CSV parse error in {}: {}", path.display(), e)))?;

            let timestamp = parse_timestamp(&row.date)
                .ok_or_else(|| data_error(format!("invalid date format: {:?}", row.date)))?;
            let date = timestamp.date();
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close: row.close.unwrap_or(f64::NAN),
                volume: row.volume.unwrap_or(f64::NAN),
            });
        }

        if bars.is_empty() {
            return Err(SteptraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded OHLCV data");
        OhlcvTable::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SteptraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Writes the ledger, one row per bar, followed by one column per
/// indicator line.
pub struct CsvLedgerWriter;

const LEDGER_COLUMNS: [&str; 11] = [
    "timestamp",
    "close",
    "signal",
    "price_change",
    "position",
    "trading_pnl",
    "fee",
    "net_pnl",
    "cumulative_pnl",
    "capital",
    "insolvent",
];

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

impl ReportPort for CsvLedgerWriter {
    fn write(&self, chart: &ChartData<'_>, output_path: &Path) -> Result<(), SteptraderError> {
        let ledger = chart.ledger;
        let mut wtr = csv::Writer::from_path(output_path)
            .map_err(|e| data_error(format!("failed to create {}: {}", output_path.display(), e)))?;

        let mut header: Vec<String> = LEDGER_COLUMNS.iter().map(|s| s.to_string()).collect();
        for indicator in &ledger.indicators {
            for i in 0..indicator.lines().len() {
                header.push(match i {
                    0 => indicator.name().to_string(),
                    _ => format!("{}[{}]", indicator.name(), i),
                });
            }
        }
        let csv_err = |e: csv::Error| data_error(format!("CSV write error: {e}"));
        wtr.write_record(&header).map_err(csv_err)?;

        for (t, row) in ledger.rows.iter().enumerate() {
            let mut record = vec![
                row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                cell(row.close),
                row.signal.map(|a| a.to_string()).unwrap_or_default(),
                row.price_change.map(cell).unwrap_or_default(),
                cell(row.position),
                row.trading_pnl.map(cell).unwrap_or_default(),
                cell(row.fee),
                cell(row.net_pnl),
                cell(row.cumulative_pnl),
                cell(row.capital),
                row.insolvent.to_string(),
            ];
            for indicator in &ledger.indicators {
                record.extend(indicator.lines().iter().map(|line| cell(line[t])));
            }
            wtr.write_record(&record).map_err(csv_err)?;
        }

        wtr.flush()?;
        Ok(())
    }
}
