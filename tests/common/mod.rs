#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use steptrader::domain::action::Action;
use steptrader::domain::crossover::crossover;
use steptrader::domain::error::SteptraderError;
use steptrader::domain::indicator::sma::Sma;
use steptrader::domain::indicator::{Frame, Indicator, Input};
pub use steptrader::domain::ohlcv::{Bar, OhlcvTable, PriceField, TableView};
use steptrader::domain::strategy::Strategy;
use steptrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, Option<NaiveDate>, Option<NaiveDate>)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OhlcvTable, SteptraderError> {
        self.requests
            .borrow_mut()
            .push((symbol.to_string(), start, end));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SteptraderError::Data {
                reason: reason.clone(),
            });
        }
        let bars: Vec<Bar> = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| {
                let d = b.timestamp.date();
                start.is_none_or(|s| d >= s) && end.is_none_or(|e| d <= e)
            })
            .collect();
        if bars.is_empty() {
            return Err(SteptraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        OhlcvTable::new(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SteptraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(i as i64)
}

pub fn make_bar(i: usize, close: f64) -> Bar {
    Bar {
        timestamp: day(i),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// One daily bar per close, starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

pub fn table_from_closes(closes: &[f64]) -> OhlcvTable {
    OhlcvTable::new(bars_from_closes(closes)).unwrap()
}

/// A deterministic wave with drift, long enough for the default strategies.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.3).sin() * 8.0 + (t * 0.07).cos() * 4.0 + t * 0.05
        })
        .collect()
}

/// Emits a fixed action on a fixed bar index.
pub struct ScriptedStrategy {
    pub script: HashMap<usize, Action>,
}

impl ScriptedStrategy {
    pub fn new(script: &[(usize, Action)]) -> Self {
        Self {
            script: script.iter().copied().collect(),
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn set_indicators(&mut self, _frame: &mut Frame<'_>) -> Result<(), SteptraderError> {
        Ok(())
    }

    fn next(&mut self, data: TableView<'_>) -> Option<Action> {
        self.script.get(&(data.len() - 1)).copied()
    }
}

/// Long when close crosses above its SMA, short when it crosses below.
pub struct CloseSmaCross {
    pub period: usize,
    sma: Indicator,
    close: Vec<f64>,
}

impl CloseSmaCross {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            sma: Indicator::default(),
            close: Vec::new(),
        }
    }
}

impl Strategy for CloseSmaCross {
    fn set_indicators(&mut self, frame: &mut Frame<'_>) -> Result<(), SteptraderError> {
        self.sma = frame.declare(&Sma, &[PriceField::Close.into(), Input::from(self.period)])?;
        self.close = frame.data().close();
        Ok(())
    }

    fn next(&mut self, _data: TableView<'_>) -> Option<Action> {
        if crossover(&self.close, &self.sma) {
            Some(Action::Long)
        } else if crossover(&self.sma, &self.close) {
            Some(Action::Short)
        } else {
            None
        }
    }
}
