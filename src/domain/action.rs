//! Per-bar trading decisions.
//!
//! "No action" is `Option::<Action>::None`; an action sequence is always a
//! `Vec<Option<Action>>` aligned 1:1 with the table.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Long,
    Short,
    Flatten,
}

impl Action {
    /// Target holding implied by the action: +1, -1 or 0.
    pub fn position(self) -> f64 {
        match self {
            Action::Long => 1.0,
            Action::Short => -1.0,
            Action::Flatten => 0.0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Long => "long",
            Action::Short => "short",
            Action::Flatten => "flatten",
        };
        f.write_str(s)
    }
}
