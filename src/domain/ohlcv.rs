//! OHLCV bars, the validated table and its read-only prefix view.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::error::SteptraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }

    fn has_missing_value(&self) -> bool {
        PriceField::ALL.iter().any(|&f| self.field(f).is_nan())
    }
}

/// One of the five required price columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }

    /// Single-letter legend abbreviation.
    pub fn abbreviation(self) -> &'static str {
        &self.name()[..1]
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bars keyed by strictly increasing timestamp, with no missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvTable {
    bars: Vec<Bar>,
    sorted: bool,
}

impl OhlcvTable {
    /// Validates `bars`. Out-of-order input is sorted with a warning; duplicate
    /// timestamps, NaN fields and empty input are rejected.
    pub fn new(mut bars: Vec<Bar>) -> Result<Self, SteptraderError> {
        if bars.is_empty() {
            return Err(SteptraderError::InvalidTable {
                reason: "table has no bars".into(),
            });
        }

        if let Some(bar) = bars.iter().find(|b| b.has_missing_value()) {
            return Err(SteptraderError::InvalidTable {
                reason: format!(
                    "some ohlcv values are missing (NaN) at {}; drop or fill those rows upstream",
                    bar.timestamp
                ),
            });
        }

        let ascending = bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
        if !ascending {
            tracing::warn!("data index is not sorted in ascending order, sorting automatically");
            bars.sort_by_key(|b| b.timestamp);
        }

        if let Some(w) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(SteptraderError::InvalidTable {
                reason: format!("duplicate timestamp {}", w[0].timestamp),
            });
        }

        Ok(Self {
            bars,
            sorted: !ascending,
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// True when the input had to be re-sorted during validation.
    pub fn was_sorted(&self) -> bool {
        self.sorted
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.view().column(PriceField::Close)
    }

    /// The whole table as a view.
    pub fn view(&self) -> TableView<'_> {
        TableView { bars: &self.bars }
    }

    /// Bars `[0, end)`; `end` is clamped to the table length.
    pub fn prefix(&self, end: usize) -> TableView<'_> {
        TableView {
            bars: &self.bars[..end.min(self.bars.len())],
        }
    }
}

/// Read-only window over the first bars of a table.
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    bars: &'a [Bar],
}

impl<'a> TableView<'a> {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    pub fn last(&self) -> Option<&'a Bar> {
        self.bars.last()
    }

    pub fn column(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| b.field(field)).collect()
    }

    pub fn open(&self) -> Vec<f64> {
        self.column(PriceField::Open)
    }

    pub fn high(&self) -> Vec<f64> {
        self.column(PriceField::High)
    }

    pub fn low(&self) -> Vec<f64> {
        self.column(PriceField::Low)
    }

    pub fn close(&self) -> Vec<f64> {
        self.column(PriceField::Close)
    }

    pub fn volume(&self) -> Vec<f64> {
        self.column(PriceField::Volume)
    }
}
