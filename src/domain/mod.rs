//! Core domain types and logic.

pub mod action;
pub mod backtest;
pub mod broker;
pub mod config_validation;
pub mod crossover;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod signal;
pub mod strategies;
pub mod strategy;
