//! Indicator declaration, validation and retention.
//!
//! A [`Frame`] is what a strategy sees during one replay step: the visible
//! prefix of the table plus the indicators declared so far in that step.
//! Declarations whose length equals the full table are recorded in the
//! [`IndicatorRegistry`] for display, one entry per name, latest wins.

use std::borrow::Cow;

use crate::domain::error::SteptraderError;
use crate::domain::indicator::{
    display_name, Arg, Args, Indicator, IndicatorFn, IndicatorOutput, Input, SeriesBuf,
};
use crate::domain::ohlcv::TableView;

#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    full_len: usize,
    retained: Vec<Indicator>,
}

impl IndicatorRegistry {
    /// Registry for a table of `full_len` bars.
    pub fn new(full_len: usize) -> Self {
        Self {
            full_len,
            retained: Vec::new(),
        }
    }

    pub fn full_len(&self) -> usize {
        self.full_len
    }

    /// Retained indicators in first-declaration order.
    pub fn indicators(&self) -> &[Indicator] {
        &self.retained
    }

    pub fn get(&self, name: &str) -> Option<&Indicator> {
        self.retained.iter().find(|i| i.name() == name)
    }

    pub fn into_indicators(self) -> Vec<Indicator> {
        self.retained
    }

    fn record(&mut self, indicator: &Indicator) {
        if indicator.len() != self.full_len {
            return;
        }
        tracing::debug!(name = indicator.name(), "retaining indicator");
        match self
            .retained
            .iter_mut()
            .find(|i| i.name() == indicator.name())
        {
            Some(existing) => *existing = indicator.clone(),
            None => self.retained.push(indicator.clone()),
        }
    }
}

/// One replay step's working copy: visible data plus this step's columns.
#[derive(Debug)]
pub struct Frame<'a> {
    data: TableView<'a>,
    columns: Vec<Indicator>,
    registry: &'a mut IndicatorRegistry,
}

impl<'a> Frame<'a> {
    pub fn new(data: TableView<'a>, registry: &'a mut IndicatorRegistry) -> Self {
        Self {
            data,
            columns: Vec::new(),
            registry,
        }
    }

    /// The visible prefix of the table.
    pub fn data(&self) -> TableView<'a> {
        self.data
    }

    /// An indicator declared earlier in this step.
    pub fn column(&self, name: &str) -> Option<&Indicator> {
        self.columns.iter().rev().find(|i| i.name() == name)
    }

    pub fn columns(&self) -> &[Indicator] {
        &self.columns
    }

    /// Computes, validates and records an indicator over the visible data.
    ///
    /// Failures inside `func` become `Indicator` errors; outputs whose
    /// sequence dimension does not match the visible length become
    /// `IndicatorShape` errors.
    pub fn declare<F>(&mut self, func: &F, inputs: &[Input]) -> Result<Indicator, SteptraderError>
    where
        F: IndicatorFn + ?Sized,
    {
        let name = display_name(&func.name(), inputs);
        let rows = self.data.len();

        let output = {
            let resolved = self.resolve(inputs).map_err(|reason| SteptraderError::Indicator {
                name: name.clone(),
                reason,
            })?;
            let args = Args::new(resolved.iter().map(|r| r.as_arg(self.data)).collect());
            func.compute(&args)
                .map_err(|e| SteptraderError::Indicator {
                    name: name.clone(),
                    reason: e.to_string(),
                })?
        };

        let lines = normalize(output, rows).map_err(|actual| SteptraderError::IndicatorShape {
            name: name.clone(),
            expected: format!("({rows},)"),
            actual,
        })?;

        let indicator = Indicator::new(name, lines);
        self.registry.record(&indicator);
        self.columns.push(indicator.clone());
        Ok(indicator)
    }

    fn resolve<'s>(&'s self, inputs: &'s [Input]) -> Result<Vec<Resolved<'s>>, String> {
        inputs
            .iter()
            .map(|input| match input {
                Input::Column(field) => Ok(Resolved::Series(Cow::Owned(self.data.column(*field)))),
                Input::Table => Ok(Resolved::Table),
                Input::Indicator(name) => self
                    .column(name)
                    .map(|i| Resolved::Series(Cow::Borrowed(i.values())))
                    .ok_or_else(|| format!("no indicator named \"{name}\" declared in this step")),
                Input::Number(value) => Ok(Resolved::Number(*value)),
                Input::Text(text) => Ok(Resolved::Text(text)),
            })
            .collect()
    }
}

enum Resolved<'s> {
    Series(SeriesBuf<'s>),
    Table,
    Number(f64),
    Text(&'s str),
}

impl<'s> Resolved<'s> {
    fn as_arg<'r>(&'r self, data: TableView<'r>) -> Arg<'r> {
        match self {
            Resolved::Series(values) => Arg::Series(values),
            Resolved::Table => Arg::Table(data),
            Resolved::Number(value) => Arg::Number(*value),
            Resolved::Text(text) => Arg::Text(text),
        }
    }
}

/// Aligns the sequence dimension with `rows`. Returns the actual shape on
/// failure.
fn normalize(output: IndicatorOutput, rows: usize) -> Result<Vec<Vec<f64>>, String> {
    match output {
        IndicatorOutput::Series(values) => {
            if values.len() == rows && rows > 0 {
                Ok(vec![values])
            } else {
                Err(format!("({},)", values.len()))
            }
        }
        IndicatorOutput::Matrix(matrix) => {
            let height = matrix.len();
            let width = matrix.first().map_or(0, Vec::len);
            if matrix.iter().any(|row| row.len() != width) {
                let lens: Vec<String> = matrix.iter().map(|r| r.len().to_string()).collect();
                return Err(format!("ragged rows [{}]", lens.join(", ")));
            }
            if height == 0 || width == 0 {
                return Err(format!("({height}, {width})"));
            }
            if width == rows {
                Ok(matrix)
            } else if height == rows {
                Ok((0..width)
                    .map(|c| matrix.iter().map(|row| row[c]).collect())
                    .collect())
            } else {
                Err(format!("({height}, {width})"))
            }
        }
    }
}
