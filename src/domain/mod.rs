//! Core domain types and logic: candles to indicators to scores to rankings.

pub mod ohlcv;
pub mod market;
pub mod timeframe;
pub mod series;
pub mod indicator;
pub mod indicator_helpers;
pub mod indicator_bank;
pub mod snapshot;
pub mod rule;
pub mod rule_parser;
pub mod rule_eval;
pub mod scoring;
pub mod ranking;
pub mod scan;
pub mod universe;
pub mod config_validation;
pub mod error;
