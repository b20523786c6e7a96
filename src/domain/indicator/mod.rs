//! Indicators: derived series aligned to the table.
//!
//! This module provides:
//! - `Indicator`: a named, validated series (one or more lines)
//! - `Input`: describable inputs, resolved to `Arg`s for the indicator function
//! - `IndicatorFn`: the capability an indicator function implements
//! - `IndicatorOutput`: what an indicator function returns before validation
//!
//! Declaration and retention live in [`registry`].

pub mod dual_thrust;
pub mod ema;
pub mod macd;
pub mod registry;
pub mod rolling;
pub mod sma;

pub use registry::{Frame, IndicatorRegistry};

use std::borrow::Cow;
use std::fmt;

use crate::domain::ohlcv::{PriceField, TableView};

const MAX_NAME_CHARS: usize = 10;

/// A validated indicator. Every line has one value per bar of the table it
/// was computed on; NaN marks warm-up values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indicator {
    name: String,
    lines: Vec<Vec<f64>>,
}

impl Indicator {
    pub(crate) fn new(name: String, lines: Vec<Vec<f64>>) -> Self {
        Self { name, lines }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First line.
    pub fn values(&self) -> &[f64] {
        self.lines.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn lines(&self) -> &[Vec<f64>] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&[f64]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.values().last().copied()
    }
}

impl AsRef<[f64]> for Indicator {
    fn as_ref(&self) -> &[f64] {
        self.values()
    }
}

/// Raw result of an indicator function.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    Series(Vec<f64>),
    /// Outer vector is rows. Either orientation is accepted.
    Matrix(Vec<Vec<f64>>),
}

impl From<Vec<f64>> for IndicatorOutput {
    fn from(values: Vec<f64>) -> Self {
        IndicatorOutput::Series(values)
    }
}

impl From<Vec<Vec<f64>>> for IndicatorOutput {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        IndicatorOutput::Matrix(rows)
    }
}

/// Failure inside an indicator function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ComputeError(pub String);

impl ComputeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An indicator input, described in the legend and resolved before the
/// function runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A price column of the visible table.
    Column(PriceField),
    /// The whole visible table.
    Table,
    /// An indicator declared earlier in the same step, by display name.
    Indicator(String),
    Number(f64),
    Text(String),
}

impl Input {
    /// Legend fragment for this input.
    pub fn describe(&self) -> String {
        match self {
            Input::Column(field) => field.abbreviation().to_string(),
            Input::Table => "df".to_string(),
            Input::Indicator(name) => truncate_name(name),
            Input::Number(value) => value.to_string(),
            Input::Text(text) => text.clone(),
        }
    }
}

impl From<PriceField> for Input {
    fn from(field: PriceField) -> Self {
        Input::Column(field)
    }
}

impl From<f64> for Input {
    fn from(value: f64) -> Self {
        Input::Number(value)
    }
}

impl From<usize> for Input {
    fn from(value: usize) -> Self {
        Input::Number(value as f64)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<&Indicator> for Input {
    fn from(indicator: &Indicator) -> Self {
        Input::Indicator(indicator.name().to_string())
    }
}

/// A resolved input as seen by an indicator function.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Series(&'a [f64]),
    Table(TableView<'a>),
    Number(f64),
    Text(&'a str),
}

impl Arg<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Series(_) => "series",
            Arg::Table(_) => "table",
            Arg::Number(_) => "number",
            Arg::Text(_) => "text",
        }
    }
}

/// Positional arguments with typed accessors. A wrong or missing argument is
/// a `ComputeError`.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    items: Vec<Arg<'a>>,
}

impl<'a> Args<'a> {
    pub fn new(items: Vec<Arg<'a>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Arg<'a>, ComputeError> {
        self.items
            .get(index)
            .copied()
            .ok_or_else(|| ComputeError::new(format!("missing argument {index}")))
    }

    pub fn series(&self, index: usize) -> Result<&'a [f64], ComputeError> {
        match self.get(index)? {
            Arg::Series(values) => Ok(values),
            other => Err(mismatch(index, "series", &other)),
        }
    }

    pub fn table(&self, index: usize) -> Result<TableView<'a>, ComputeError> {
        match self.get(index)? {
            Arg::Table(view) => Ok(view),
            other => Err(mismatch(index, "table", &other)),
        }
    }

    pub fn number(&self, index: usize) -> Result<f64, ComputeError> {
        match self.get(index)? {
            Arg::Number(value) => Ok(value),
            other => Err(mismatch(index, "number", &other)),
        }
    }

    /// A strictly positive whole number, e.g. a window length.
    pub fn period(&self, index: usize) -> Result<usize, ComputeError> {
        let value = self.number(index)?;
        if value >= 1.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
            Ok(value as usize)
        } else {
            Err(ComputeError::new(format!(
                "argument {index} must be a positive integer, got {value}"
            )))
        }
    }

    pub fn text(&self, index: usize) -> Result<&'a str, ComputeError> {
        match self.get(index)? {
            Arg::Text(text) => Ok(text),
            other => Err(mismatch(index, "text", &other)),
        }
    }
}

fn mismatch(index: usize, expected: &str, found: &Arg<'_>) -> ComputeError {
    ComputeError::new(format!(
        "argument {index} must be a {expected}, got a {}",
        found.kind()
    ))
}

/// A function computing an indicator from resolved arguments.
pub trait IndicatorFn {
    /// Function name used in the legend.
    fn name(&self) -> String;

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError>;
}

/// Adapts a closure into an [`IndicatorFn`].
pub struct FnIndicator<F> {
    name: String,
    func: F,
}

impl<F> fmt::Debug for FnIndicator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnIndicator").field("name", &self.name).finish()
    }
}

pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnIndicator<F>
where
    F: Fn(&Args<'_>) -> Result<IndicatorOutput, ComputeError>,
{
    FnIndicator {
        name: name.into(),
        func,
    }
}

impl<F> IndicatorFn for FnIndicator<F>
where
    F: Fn(&Args<'_>) -> Result<IndicatorOutput, ComputeError>,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        (self.func)(args)
    }
}

/// A raw price column of a table argument: `close(df)`.
#[derive(Debug, Clone, Copy)]
pub struct Price(pub PriceField);

impl IndicatorFn for Price {
    fn name(&self) -> String {
        self.0.name().to_string()
    }

    fn compute(&self, args: &Args<'_>) -> Result<IndicatorOutput, ComputeError> {
        Ok(args.table(0)?.column(self.0).into())
    }
}

/// `function(arg1,arg2,...)`, or just `function` without describable inputs.
pub fn display_name(function: &str, inputs: &[Input]) -> String {
    let params: Vec<String> = inputs
        .iter()
        .map(Input::describe)
        .filter(|s| !s.is_empty())
        .collect();
    let function = truncate_name(function);
    if params.is_empty() {
        function
    } else {
        format!("{}({})", function, params.join(","))
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_CHARS {
        let head: String = name.chars().take(MAX_NAME_CHARS - 1).collect();
        format!("{head}…")
    } else {
        name.to_string()
    }
}

/// Owned or borrowed storage behind an `Arg::Series`.
pub(crate) type SeriesBuf<'a> = Cow<'a, [f64]>;

/// NaN-propagating maximum.
pub(crate) fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}
