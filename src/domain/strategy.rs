//! Strategy contract.
//!
//! A strategy declares its indicators against whatever prefix of the table is
//! visible, then decides. It never sees bars past the current one.

use crate::domain::action::Action;
use crate::domain::error::SteptraderError;
use crate::domain::indicator::Frame;
use crate::domain::ohlcv::TableView;

pub trait Strategy {
    /// Name shown in the report. Defaults to the type name.
    fn name(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }

    /// Declare indicators via `frame.declare`. Runs once per replay step,
    /// against the prefix visible at that step.
    fn set_indicators(&mut self, frame: &mut Frame<'_>) -> Result<(), SteptraderError>;

    /// Decide on the last visible bar.
    fn next(&mut self, data: TableView<'_>) -> Option<Action>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn set_indicators(&mut self, frame: &mut Frame<'_>) -> Result<(), SteptraderError> {
        (**self).set_indicators(frame)
    }

    fn next(&mut self, data: TableView<'_>) -> Option<Action> {
        (**self).next(data)
    }
}
