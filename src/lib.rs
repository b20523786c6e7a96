//! steptrader: event-driven backtester for strategies over OHLCV series.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line entry in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
